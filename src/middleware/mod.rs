pub mod csp;
pub mod csrf;
