pub mod backend_service;
pub mod roster_service;
pub mod sanitizer;
pub mod signup_service;
