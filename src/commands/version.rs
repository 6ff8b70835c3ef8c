use super::CommandError;

/// `minls version`
pub fn run() -> Result<(), CommandError> {
    print!("{}", render_version());
    Ok(())
}

pub fn render_version() -> String {
    format!(
        "Build version:\t{}\nTarget OS:\t{}\nTarget arch:\t{}\n",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}
