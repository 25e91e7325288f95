mod app;
mod canvas;
mod dom;
mod files;
mod util;

pub use app::run;
