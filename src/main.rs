mod access;
mod app;
mod audio;
mod config;
mod library;
mod lyrics;
mod mpris;
mod runtime;
mod session;
mod state;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
