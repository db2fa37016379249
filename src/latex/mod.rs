pub mod compiler;
pub mod workspace;
