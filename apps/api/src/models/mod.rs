pub mod cover_letter;
pub mod resume;

pub use cover_letter::CoverLetterData;
pub use resume::{Author, Entry, Interest, ResumeData, ResumeDocument, SkillCategory, SkillItem};
