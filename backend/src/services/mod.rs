pub mod auth;
pub mod books;
