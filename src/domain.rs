pub mod entities;
pub mod spam;
pub mod use_cases;
