//! Terminal collaborators: toasts and redirects go to stderr, results to stdout.

use std::io::{self, Write};

use coobet_api::models::Page;
use coobet_api::{Language, Navigator, Notifier, Toast, ToastLevel};
use serde::Serialize;

pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, toast: Toast) {
        eprintln!("{}", format_toast(&toast));
    }
}

pub struct StderrNavigator;

impl Navigator for StderrNavigator {
    fn redirect(&self, route: &str) {
        eprintln!("-> {route}");
    }
}

fn format_toast(toast: &Toast) -> String {
    let label = match (toast.level, toast.language) {
        (ToastLevel::Success, Language::French) => "Succès",
        (ToastLevel::Error, Language::French) => "Erreur",
        (ToastLevel::Success, Language::Default) => "Success",
        (ToastLevel::Error, Language::Default) => "Error",
    };
    format!("[{label}] {}", toast.message)
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Tell the operator on stderr how to fetch the following page.
pub fn print_next_page_hint<T>(page: &Page<T>, current: Option<u32>) {
    if let Some(next) = next_page(page, current) {
        eprintln!("More results: rerun with --page {next}");
    }
}

fn next_page<T>(page: &Page<T>, current: Option<u32>) -> Option<u32> {
    page.has_next().then(|| current.unwrap_or(1) + 1)
}
