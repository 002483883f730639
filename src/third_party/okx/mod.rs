pub mod api_path;
pub mod data;
pub mod sign;
