pub mod assets;
pub mod health;
pub mod results;
pub mod upload;
