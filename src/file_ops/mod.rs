// File access for the assistant: reading, atomic writing, backups and static analysis.

pub mod analyzer;
pub mod backup;
pub mod ignore;
pub mod reader;
pub mod writer;

pub use analyzer::CodeAnalyzer;
pub use backup::{BackupEntry, BackupManager, BackupStats};
pub use ignore::IgnoreRules;
pub use reader::FileReader;
pub use writer::FileWriter;
