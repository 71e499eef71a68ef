//! Runs in its own test binary because it changes the working directory.

use std::fs;

use spotify_lineup_matcher::config::load_dotenv;

#[test]
fn env_file_path_is_handed_back() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".env"), "LINEUP_MATCHER_DOTENV_CHECK=loaded\n").unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let path = load_dotenv().unwrap();

    assert_eq!(path.file_name().unwrap(), ".env");
    assert_eq!(std::env::var("LINEUP_MATCHER_DOTENV_CHECK").unwrap(), "loaded");
}
