#[allow(non_snake_case)]
pub mod Cascade;
#[allow(non_snake_case)]
pub mod Centrifuge;
#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Utils;
pub mod cascade_errors;
