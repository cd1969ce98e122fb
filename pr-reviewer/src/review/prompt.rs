//! Instruction template and request rendering for the batched review call.
//!
//! The template is a versioned configuration string: it defines the reply
//! contract (`## File: <path>` sections, fixed clean sentence) that
//! `parse::FILE_HEADING` depends on. Change them together and bump
//! [`INSTRUCTIONS_VERSION`].

use std::path::Path;

use crate::provider::SourceFile;

/// Version of the reply contract below.
pub const INSTRUCTIONS_VERSION: u32 = 1;

/// System-level review policy sent with every batch.
pub const REVIEW_INSTRUCTIONS: &str = r#"You are an expert software architect and code reviewer.
Your task is to review every provided code file in detail.

For each code file provided, do the following:

1. **Summary of Issues**
   - Analyze the full file and **only list actual, meaningful problems** such as:
     - Code smells
     - Design-principle violations
     - Misleading, unclear, or inconsistent naming
     - Anti-patterns
     - Security vulnerabilities (e.g., injection, hardcoded secrets, unsafe file operations)
     - Performance issues
     - Bug risks and logical flaws
   - Do NOT list stylistic issues if the code is already clean and readable.
   - Do NOT suggest changes just for personal preference.
   - If no issues are found, **skip the file completely** in the response.

2. **Suggestions**
   - For each issue (if any), provide a numbered, concrete suggestion.

3. **Improved Code**
   - If there are valid issues, generate a revised version of the file with the
     improvements applied, idiomatic and consistent with best practices.

4. **Important**:
   - If a file is clean and has no meaningful issues, do not include it in the
     response at all.
   - If **no files** require improvement, return exactly:
     The pull request is clean. No changes required.

Use this output format for each file (only if it has issues):

## File: path/to/filename

**Summary of Issues**

1. ...
2. ...

**Suggestions**

1. ...
2. ...

```
// improved code
```
"#;

/// Renders the user-content block: every file in one blob, each preceded by a
/// header naming its path and an advisory language tag.
pub fn render_request_body(files: &[SourceFile]) -> String {
    let blocks: Vec<String> = files
        .iter()
        .map(|f| {
            format!(
                "File: {}\n```{}\n{}\n```",
                f.path,
                language_tag(&f.path),
                f.content
            )
        })
        .collect();
    blocks.join("\n\n")
}

/// Advisory fence label derived from the file extension. Unrecognized
/// extensions get an empty label; the label never blocks processing.
pub(crate) fn language_tag(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "cs" => "csharp",
        "cshtml" => "razor",
        "rs" => "rust",
        "js" => "javascript",
        "ts" => "typescript",
        "py" => "python",
        "go" => "go",
        "scss" => "scss",
        "css" => "css",
        "html" => "html",
        "json" => "json",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &str) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn instructions_carry_the_reply_contract() {
        assert!(REVIEW_INSTRUCTIONS.contains("## File: "));
        assert!(
            REVIEW_INSTRUCTIONS.contains("The pull request is clean. No changes required.")
        );
    }

    #[test]
    fn known_extensions_map_to_language_labels() {
        assert_eq!(language_tag("src/App.cs"), "csharp");
        assert_eq!(language_tag("view.CSHTML"), "razor");
        assert_eq!(language_tag("lib.rs"), "rust");
        assert_eq!(language_tag("index.ts"), "typescript");
    }

    #[test]
    fn unknown_extension_gets_empty_label() {
        assert_eq!(language_tag("data.parquet"), "");
        assert_eq!(language_tag("Makefile"), "");
    }

    #[test]
    fn request_body_wraps_each_file_in_a_tagged_fence() {
        let body = render_request_body(&[file("a.cs", "class A {}")]);
        assert_eq!(body, "File: a.cs\n```csharp\nclass A {}\n```");
    }

    #[test]
    fn files_are_joined_with_blank_lines() {
        let body = render_request_body(&[file("a.cs", "x"), file("b.unknown", "y")]);
        assert_eq!(
            body,
            "File: a.cs\n```csharp\nx\n```\n\nFile: b.unknown\n```\ny\n```"
        );
    }
}
