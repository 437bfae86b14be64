//! Shell completions and man pages.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;

use crate::Cli;

const BIN_NAME: &str = "forgepulse";

fn render_completions(shell: clap_complete::Shell, out: &mut impl Write) {
    clap_complete::generate(shell, &mut Cli::command(), BIN_NAME, out);
}

fn render_man(out: &mut impl Write) -> std::io::Result<()> {
    clap_mangen::Man::new(Cli::command()).render(out)
}

fn write_man_pages(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    clap_mangen::generate_to(Cli::command(), dir)
}

pub(crate) fn handle_completions(
    shell: clap_complete::Shell,
) -> Result<(), Box<dyn std::error::Error>> {
    render_completions(shell, &mut std::io::stdout().lock());
    Ok(())
}

/// Print the main page, or write every page into `output`.
pub(crate) fn handle_man(output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(dir) => {
            write_man_pages(&dir)?;
            println!("Generated man pages in: {}", dir.display());
        }
        None => render_man(&mut std::io::stdout().lock())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_script_names_the_binary() {
        let mut out = Vec::new();
        render_completions(clap_complete::Shell::Bash, &mut out);
        let script = String::from_utf8(out).expect("completion output should be UTF-8");
        assert!(script.contains(BIN_NAME));
        assert!(script.contains("dashboard"));
    }

    #[test]
    fn man_page_has_title() {
        let mut out = Vec::new();
        render_man(&mut out).expect("man rendering should succeed");
        let page = String::from_utf8(out).expect("man output should be UTF-8");
        assert!(page.to_lowercase().contains(".th forgepulse"));
    }

    #[test]
    fn man_pages_cover_subcommands() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("man");

        write_man_pages(&out).expect("man page generation should succeed");

        let pages: Vec<String> = std::fs::read_dir(&out)
            .expect("output directory should exist")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert!(pages.iter().any(|p| p == "forgepulse.1"));
        assert!(pages.iter().any(|p| p.starts_with("forgepulse-dashboard")));
    }
}
