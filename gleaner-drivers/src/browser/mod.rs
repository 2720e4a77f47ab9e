pub mod element;
pub mod options;
pub mod selector;
pub mod session;
