pub mod short_url;
pub mod user_url;
