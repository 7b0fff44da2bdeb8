use console::style;

use crate::config::CatalogConfig;
use crate::constants::display::{CARD_PREVIEW_CHARS, CARD_TITLE_CHARS};
use crate::types::{Comment, CommentThread, Prompt, truncate_chars};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Aligned `label: value` line
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("  {:<14} {}", style(format!("{}:", label)).dim(), value);
    }

    /// One-card summary used by feed and listing commands
    pub fn card(&self, prompt: &Prompt, catalog: &CatalogConfig) {
        let category = catalog
            .category(&prompt.category)
            .map(|c| c.display())
            .unwrap_or_else(|| prompt.category.clone());
        let model = catalog.ai_model_label(&prompt.ai_model);

        println!(
            "{}  {}",
            style(truncate_chars(&prompt.title, CARD_TITLE_CHARS)).bold(),
            style(format!("[{} · {}]", category, model)).cyan()
        );
        println!(
            "  {}",
            truncate_chars(&prompt.content.replace('\n', " "), CARD_PREVIEW_CHARS)
        );
        println!(
            "  {}  ♥ {}  ★ {}  ↗ {}  💬 {}  👁 {}",
            style(format!("by {}", prompt.author_name)).dim(),
            prompt.stats.likes,
            prompt.stats.bookmarks,
            prompt.stats.shares,
            prompt.stats.comments,
            prompt.stats.views
        );
        println!("  {}", style(&prompt.id).dim());
    }

    pub fn comment(&self, comment: &Comment, indent: usize) {
        let pad = " ".repeat(indent);
        let author = if comment.is_active() {
            style(comment.author_name.clone()).bold()
        } else {
            style(comment.author_name.clone()).dim()
        };
        println!(
            "{}{} {}  {}",
            pad,
            author,
            style(comment.created_at.format("%Y-%m-%d %H:%M")).dim(),
            style(format!("♥ {} · {}", comment.likes, comment.id)).dim()
        );
        println!("{}  {}", pad, comment.content);
    }

    pub fn thread(&self, thread: &CommentThread) {
        if thread.is_empty() {
            println!("  {}", style("No comments yet").dim());
            return;
        }
        for node in &thread.roots {
            self.comment(&node.comment, 2);
            for reply in &node.replies {
                self.comment(reply, 6);
            }
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
