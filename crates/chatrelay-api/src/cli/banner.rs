//! Welcome banner for the chat loop.

use console::style;

pub fn print_welcome_banner(chat_id: &str, backend: &str, accepted_files: Option<&str>) {
    println!();
    println!("  {} {}", style("chatrelay").cyan().bold(), style(chat_id).bold());
    println!("  {}  {}", style("Backend:").bold(), style(backend).dim());
    println!(
        "  {}  {}",
        style("Accepts:").bold(),
        style(accepted_files.unwrap_or("any file")).dim()
    );
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}
