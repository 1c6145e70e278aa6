use console::Color;

use crate::cli::OutputFormatter;

type Row = (&'static str, &'static str, &'static str);

const CHAT_COMMANDS: &[Row] = &[
    ("chats", "", "List all available chat sessions"),
    ("newchat", "[name]", "Create new chat (optional custom name)"),
    ("loadchat", "<name>", "Load an existing chat session"),
    ("deletechat", "<name>", "Delete a chat (with confirmation)"),
    ("history", "[limit]", "Show recent messages (default: 10)"),
];

const FILE_COMMANDS: &[Row] = &[
    ("upload", "<file_path>", "Upload a file and tell Ayre what to do with it"),
    ("analyze", "<file_path>", "Deep analysis of file content"),
    ("context", "<file_path>", "Add file to conversation context"),
    ("gui", "", "Watch the drop folder for new files"),
    ("drag & drop", "file_path", "Drop files directly into terminal"),
];

const LINK_COMMANDS: &[Row] = &[
    ("open", "<url>", "Open URL (option to analyze content)"),
    ("analyze", "<url> [question]", "Analyze web page content with AI"),
    ("https://...", "", "Auto-detect URLs (choose open/analyze)"),
    ("Auto-detect", "", "Links in responses are offered for opening"),
];

const SYSTEM_COMMANDS: &[Row] = &[
    ("help", "", "Show this command reference"),
    ("exit", "", "Save and exit"),
    ("quit", "", "Save and exit"),
];

const EXAMPLES: &str = "📝 Usage Examples:

Chat Management:
• newchat project_analysis - Create chat named \"project_analysis\"
• chats - List all chats
• loadchat project_analysis - Switch to that chat
• history 20 - Show last 20 messages
• deletechat old_chat - Delete \"old_chat\"

File Operations:
• upload ~/Documents/report.pdf - Upload a PDF and give instructions
• analyze code.py - Deep analysis of a source file
• context data.json - Add JSON to conversation context
• gui - Process files dropped into the drop folder

Web Analysis:
• analyze https://github.com/user/repo - Analyze a repository page
• analyze https://docs.rs/tokio What is a runtime? - Ask a specific question
• https://stackoverflow.com/questions/123 - Auto-detect and choose action
• open https://example.com - Open with option to analyze";

const FILE_TYPES: &str = "📋 Supported File Types:

Images (analyzed): .jpg, .jpeg, .png, .gif, .webp, .bmp
Text (added as context): .py, .js, .ts, .html, .css, .txt, .md, .rs, .go,
  .c, .cpp, .h, .java, .json, .xml, .csv, .yaml, .yml, .toml, .sh
Anything else: uploaded and analyzed";

pub fn render_help(formatter: &OutputFormatter) -> String {
    let sections = [
        ("💬 Chat Management", CHAT_COMMANDS),
        ("📁 File Management", FILE_COMMANDS),
        ("🔗 Link Management", LINK_COMMANDS),
        ("⚙️ System Commands", SYSTEM_COMMANDS),
    ];

    let mut output = formatter.format_panel(
        "",
        "AYRE Command Reference\nYour guide to resonating with the AI companion",
        Color::Red,
    );

    for (title, rows) in sections {
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|(command, args, description)| {
                vec![command.to_string(), args.to_string(), description.to_string()]
            })
            .collect();
        output.push_str("\n\n");
        output.push_str(&formatter.format_table(
            title,
            &["Command", "Arguments", "Description"],
            &rows,
        ));
    }

    output.push_str("\n\n");
    output.push_str(&formatter.format_panel("", EXAMPLES, Color::White));
    output.push('\n');
    output.push_str(&formatter.format_panel("", FILE_TYPES, Color::White));
    output
}

pub fn render_banner(formatter: &OutputFormatter, user_label: &str) -> String {
    let tips = format!(
        "Welcome, {user_label}.\n\
         1. Ask questions about Armored Core, Ayre, or anything else.\n\
         2. Drag & drop files into the terminal or use the gui command\n\
         3. Commands: upload, analyze, context, gui\n\
         4. Chat commands: chats, newchat, loadchat, deletechat, history\n\
         5. Link commands: open <url> or paste URLs directly\n\
         6. Type help for the command reference or exit to leave the resonance."
    );

    let mut output = formatter.format_prompt("AYRE - Your Resonant AI Companion (Gemini)");
    output.push_str("\n\n");
    output.push_str(&formatter.format_panel("Getting Started", &tips, Color::Red));
    output
}
