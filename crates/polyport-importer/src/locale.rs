//! Localized section headings for generated statements
//!
//! Statement sections carry headings in the statement's own language. The
//! table covers the site's languages; anything else falls back to English.

/// Statement sections that get a heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Input,
    Output,
    Interaction,
    Scoring,
    Samples,
    Notes,
}

/// Heading text for `section` in `language`
pub fn heading(language: &str, section: Section) -> &'static str {
    match language {
        "ru" => match section {
            Section::Input => "Входные данные",
            Section::Output => "Выходные данные",
            Section::Interaction => "Протокол взаимодействия",
            Section::Scoring => "Система оценки",
            Section::Samples => "Примеры",
            Section::Notes => "Примечание",
        },
        "kk" => match section {
            Section::Input => "Енгізілетін деректер",
            Section::Output => "Шығарылатын деректер",
            Section::Interaction => "Өзара әрекеттесу хаттамасы",
            Section::Scoring => "Бағалау жүйесі",
            Section::Samples => "Мысалдар",
            Section::Notes => "Ескерту",
        },
        _ => match section {
            Section::Input => "Input",
            Section::Output => "Output",
            Section::Interaction => "Interaction",
            Section::Scoring => "Scoring",
            Section::Samples => "Samples",
            Section::Notes => "Notes",
        },
    }
}

/// Heading of the `index`-th sample input or output block
pub fn sample_heading(language: &str, section: Section, index: usize) -> String {
    format!("{} {index}", heading(language, section))
}
