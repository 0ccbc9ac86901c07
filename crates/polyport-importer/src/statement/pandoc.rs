//! LaTeX to GitHub-flavored Markdown via pandoc
//!
//! Conversion shells out to `pandoc >= 3.0` with a Lua filter that folds
//! smart quotes, rewrites inline code and math delimiters, protects images
//! with blank lines, forces fenced code blocks, and re-emits `center` /
//! `epigraph` divs as literal HTML. A short TeX prologue redefines Polygon's
//! deprecated short commands (`\bf`, `\it`, `\tt`, `\t`) to their modern
//! equivalents.

use std::path::PathBuf;

use tokio::process::Command;

use polyport_config::PandocConfig;

use crate::error::{ImportError, ImportResult};

pub(crate) const PANDOC_FILTER: &str = r#"
local function normalize_quote(text)
    -- Smart quotes are disallowed in statements
    text = text:gsub('\u{2018}', "'") -- left single quote
    text = text:gsub('\u{2019}', "'") -- right single quote
    text = text:gsub('\u{201C}', '"') -- left double quote
    text = text:gsub('\u{201D}', '"') -- right double quote
    text = text:gsub('<<', '\u{00AB}') -- russian left quote
    text = text:gsub('>>', '\u{00BB}') -- russian right quote
    return text
end

local function escape_html_content(text)
    -- Escape HTML/Markdown/MathJax syntax characters
    text = text:gsub('&', '&amp;') -- must be first
    text = text:gsub('<', "&lt;")
    text = text:gsub('>', "&gt;")
    text = text:gsub('*', '\\*')
    text = text:gsub('_', '\\_')
    text = text:gsub('%$', '<span>%$</span>')
    text = text:gsub('~', '<span>~</span>')
    return text
end

function Math(m)
    local delimiter = m.mathtype == 'InlineMath' and '~' or '$$'
    return pandoc.RawInline('html', delimiter .. m.text .. delimiter)
end

function Image(el)
    -- Blank lines around the image so captions render
    return {pandoc.RawInline('markdown', '\n\n'), el, pandoc.RawInline('markdown', '\n\n')}
end

function Code(el)
    local text = normalize_quote(el.text)
    text = escape_html_content(text)
    return pandoc.RawInline('html', '<span style="font-family: courier new,monospace;">' .. text .. '</span>')
end

function CodeBlock(el)
    el.text = normalize_quote(el.text)

    -- An empty language tag forces backtick fences over indented blocks
    -- See https://github.com/jgm/pandoc/issues/7033
    if el.classes[1] == nil then
        el.classes[1] = ''
    end

    return el
end

function Quoted(el)
    local quote = el.quotetype == 'SingleQuote' and "'" or '"'
    local inlines = el.content
    table.insert(inlines, 1, quote)
    table.insert(inlines, quote)
    return inlines
end

function Str(el)
    el.text = normalize_quote(el.text)

    -- En dash, em dash, and NBSP stay visible to statement editors as
    -- entities
    local res = {}
    local part = ''
    for c in el.text:gmatch(utf8.charpattern) do
        if c == '\u{2013}' then
            if part ~= '' then
                table.insert(res, pandoc.Str(part))
                part = ''
            end
            table.insert(res, pandoc.RawInline('html', '&ndash;'))
        elseif c == '\u{2014}' then
            if part ~= '' then
                table.insert(res, pandoc.Str(part))
                part = ''
            end
            table.insert(res, pandoc.RawInline('html', '&mdash;'))
        elseif c == '\u{00A0}' then
            if part ~= '' then
                table.insert(res, pandoc.Str(part))
                part = ''
            end
            table.insert(res, pandoc.RawInline('html', '&nbsp;'))
        else
            part = part .. c
        end
    end
    if part ~= '' then
        table.insert(res, pandoc.Str(part))
    end

    return res
end

function Div(el)
    if el.classes[1] == 'center' then
        local res = {}
        table.insert(res, pandoc.RawBlock('markdown', '<' .. el.classes[1] .. '>'))
        for _, block in ipairs(el.content) do
            table.insert(res, block)
        end
        table.insert(res, pandoc.RawBlock('markdown', '</' .. el.classes[1] .. '>'))
        return res

    elseif el.classes[1] == 'epigraph' then
        local filter = {
            Math = Math,
            Code = Code,
            Quoted = Quoted,
            Str = Str,
            Para = function (s)
                return pandoc.Plain(s.content)
            end,
            Span = function (s)
                return s.content
            end
        }

        function renderHTML(el)
            local doc = pandoc.Pandoc({el})
            local rendered = pandoc.write(doc:walk(filter), 'html')
            return pandoc.RawBlock('markdown', rendered)
        end

        local res = {}
        table.insert(res, pandoc.RawBlock('markdown', '<div style="margin-left: 67%;">'))
        if el.content[1] then
            table.insert(res, renderHTML(el.content[1]))
        end
        table.insert(res, pandoc.RawBlock('markdown', '<div style="border-top: 1px solid #888;"></div>'))
        if el.content[2] then
            table.insert(res, renderHTML(el.content[2]))
        end
        table.insert(res, pandoc.RawBlock('markdown', '</div>'))
        return res
    end

    return nil
end
"#;

// Polygon treats \bf like \textbf and recommends \bf{...} for brevity; same
// for \it, \tt, \t. Redefining them keeps such statements compiling.
// https://polygon.codeforces.com/docs/statements-tex-manual
pub(crate) const TEX_MACROS: &str = r"
\renewcommand{\bf}{\textbf}
\renewcommand{\it}{\textit}
\renewcommand{\tt}{\texttt}
\renewcommand{\t}{\texttt}
";

/// Handle to a verified pandoc installation
#[derive(Debug, Clone)]
pub struct PandocConverter {
    binary: PathBuf,
}

impl PandocConverter {
    /// Wrap a binary path without probing it.
    ///
    /// Jobs that never convert a statement (packages without TeX statements,
    /// tests) work with an unverified path; [`PandocConverter::locate`] is
    /// the checked constructor servers use at startup.
    pub fn unchecked(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Verify the binary exists and is at least pandoc 3.0.
    ///
    /// Called once at startup; a missing or outdated converter is a hard
    /// startup error.
    pub async fn locate(config: &PandocConfig) -> ImportResult<Self> {
        let output = Command::new(&config.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| {
                ImportError::import(format!(
                    "pandoc binary {} not found: {e}",
                    config.binary.display()
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = parse_version(&stdout).ok_or_else(|| {
            ImportError::import("could not parse pandoc --version output")
        })?;

        if version.0 < 3 {
            return Err(ImportError::import(format!(
                "pandoc >= 3.0 is required, found {}.{}.{}",
                version.0, version.1, version.2
            )));
        }

        Ok(Self {
            binary: config.binary.clone(),
        })
    }

    /// Convert one LaTeX fragment to GitHub-flavored Markdown
    pub async fn tex_to_markdown(&self, tex: &str) -> ImportResult<String> {
        let scratch = tempfile::tempdir()?;
        tokio::fs::write(
            scratch.path().join("temp.tex"),
            format!("{TEX_MACROS}{tex}"),
        )
        .await?;
        tokio::fs::write(scratch.path().join("filter.lua"), PANDOC_FILTER).await?;

        let output = Command::new(&self.binary)
            .args(["--lua-filter=filter.lua", "-t", "gfm", "-o", "temp.md", "temp.tex"])
            .current_dir(scratch.path())
            .output()
            .await?;

        if !output.status.success() {
            return Err(ImportError::Pandoc {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(tokio::fs::read_to_string(scratch.path().join("temp.md")).await?)
    }
}

/// First line of `pandoc --version` is `pandoc X.Y.Z`
fn parse_version(output: &str) -> Option<(u32, u32, u32)> {
    let first_line = output.lines().next()?;
    let version = first_line.split_whitespace().nth(1)?;
    let mut parts = version.split('.').map(|p| p.parse::<u32>().ok());
    let major = parts.next()??;
    let minor = parts.next().flatten().unwrap_or(0);
    let patch = parts.next().flatten().unwrap_or(0);
    Some((major, minor, patch))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn version_lines_parse() {
        assert_eq!(
            parse_version("pandoc 3.1.8\nCompiled with ..."),
            Some((3, 1, 8))
        );
        assert_eq!(parse_version("pandoc 2.19\n"), Some((2, 19, 0)));
        assert_eq!(parse_version("garbage"), None);
    }

    // Exercises the real converter; run with `cargo test -- --ignored` on a
    // machine with pandoc >= 3.0 installed.
    #[tokio::test]
    #[ignore = "needs a local pandoc installation"]
    async fn converts_inline_math_and_short_macros() {
        let converter = PandocConverter::locate(&PandocConfig {
            binary: "pandoc".into(),
        })
        .await
        .unwrap();

        let markdown = converter
            .tex_to_markdown(r"Given $n \le 10^5$ and \bf{bold} text.")
            .await
            .unwrap();
        assert!(markdown.contains('~'));
        assert!(markdown.contains("**bold**"));
    }
}
