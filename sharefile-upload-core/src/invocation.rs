//! Builds the PowerShell invocation of the uploader script.
//!
//! Every configuration value is rendered as a single-quoted PowerShell string
//! literal through [`quote_literal`]; single-quoted literals perform no
//! variable or subexpression expansion, so the only way out of one is its own
//! delimiter, which is doubled. File lists are rendered as `@('a';'b')`.

use crate::config::UploadConfig;
use crate::resolve::ResolvedFileList;
use std::fmt;
use std::path::{Path, PathBuf};

/// Characters PowerShell accepts as a single-quote string delimiter.
const SINGLE_QUOTES: [char; 5] = ['\'', '\u{2018}', '\u{2019}', '\u{201A}', '\u{201B}'];

/// Rendering used in place of credential values in logs and dry runs.
pub const REDACTED: &str = "'***'";

/// Renders `value` as a single-quoted PowerShell literal, doubling every
/// single-quote character so the value cannot terminate the literal early.
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if SINGLE_QUOTES.contains(&c) {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Renders paths as a PowerShell array literal; an empty list renders as `@()`.
pub fn format_file_list_literal<P: AsRef<Path>>(paths: &[P]) -> String {
    let items: Vec<String> = paths
        .iter()
        .map(|p| quote_literal(&p.as_ref().to_string_lossy()))
        .collect();
    format!("@({})", items.join(";"))
}

/// PowerShell host flavour, which decides the accepted startup switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    /// `powershell.exe`, Windows PowerShell 5.x.
    WindowsPowerShell,
    /// `pwsh`, PowerShell 7+.
    PowerShellCore,
}

/// A fully assembled uploader invocation. Built once, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    script: String,
    redacted: String,
}

impl Invocation {
    /// The `-Command` argument handed to the shell.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// The same command with credential parameters replaced by `'***'`.
    pub fn redacted(&self) -> &str {
        &self.redacted
    }

    /// Complete argument vector for `shell`, ending with the script command.
    pub fn shell_args(&self, shell: ShellKind) -> Vec<String> {
        let mut args = vec!["-NoLogo".to_string()];
        if shell == ShellKind::WindowsPowerShell {
            args.push("-Sta".to_string());
        }
        args.extend(
            [
                "-NoProfile",
                "-NonInteractive",
                "-ExecutionPolicy",
                "Unrestricted",
                "-Command",
            ]
            .map(String::from),
        );
        args.push(self.script.clone());
        args
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("script", &self.redacted)
            .finish()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}

/// Accumulates the real and the redacted rendering side by side.
struct CommandLine {
    script: String,
    redacted: String,
}

impl CommandLine {
    fn call(script_path: &Path) -> Self {
        let head = format!("& {}", quote_literal(&script_path.to_string_lossy()));
        CommandLine {
            script: head.clone(),
            redacted: head,
        }
    }

    fn raw(&mut self, name: &str, value: &str) -> &mut Self {
        for out in [&mut self.script, &mut self.redacted] {
            out.push_str(" -");
            out.push_str(name);
            if !value.is_empty() {
                out.push(' ');
                out.push_str(value);
            }
        }
        self
    }

    fn text(&mut self, name: &str, value: &str) -> &mut Self {
        self.raw(name, &quote_literal(value))
    }

    fn secret(&mut self, name: &str, value: &str) -> &mut Self {
        self.script.push_str(&format!(" -{name} {}", quote_literal(value)));
        self.redacted.push_str(&format!(" -{name} {REDACTED}"));
        self
    }

    fn switch(&mut self, name: &str) -> &mut Self {
        self.raw(name, "")
    }

    fn finish(&mut self) -> Invocation {
        Invocation {
            script: std::mem::take(&mut self.script),
            redacted: std::mem::take(&mut self.redacted),
        }
    }
}

/// Assembles the fixed uploader parameter template from `config` and the
/// resolved file lists.
pub fn build_invocation(
    config: &UploadConfig,
    files: &ResolvedFileList,
    excludes: &ResolvedFileList,
) -> Invocation {
    let files: Vec<PathBuf> = files.to_vec();
    let excludes: Vec<PathBuf> = excludes.to_vec();

    CommandLine::call(&config.script_path)
        .secret("ClientID", config.client_id.expose())
        .secret("ClientSecret", config.client_secret.expose())
        .secret("Username", config.username.expose())
        .secret("Password", config.password.expose())
        .text("Subdomain", &config.subdomain)
        .text("ApplicationControlPlane", &config.application_control_plane)
        .switch("ShareParentFolderLink")
        .text("DestinationDirectory", &config.destination)
        .raw("Timeout", &config.timeout_ms.to_string())
        .raw("Files", &format_file_list_literal(&files))
        .raw("Exclude", &format_file_list_literal(&excludes))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{apply_defaults, UploadInputs};

    fn config() -> UploadConfig {
        apply_defaults(
            UploadInputs {
                client_id: "cid".into(),
                client_secret: "csecret".into(),
                username: "user@example.com".into(),
                password: "p'w".into(),
                subdomain: "acme".into(),
                destination: "/Shared/Builds".into(),
                ..Default::default()
            },
            "/opt/action/Upload-Sharefile.ps1",
        )
        .unwrap()
    }

    #[test]
    fn quote_plain_value() {
        assert_eq!(quote_literal("abc"), "'abc'");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn quote_doubles_delimiter() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal("'"), "''''");
    }

    #[test]
    fn quote_doubles_typographic_quotes() {
        assert_eq!(quote_literal("a\u{2019}b"), "'a\u{2019}\u{2019}b'");
    }

    #[test]
    fn quote_leaves_expansion_syntax_inert() {
        assert_eq!(quote_literal("$(Remove-Item x)"), "'$(Remove-Item x)'");
        assert_eq!(quote_literal("a\"b;c"), "'a\"b;c'");
    }

    #[test]
    fn empty_list_literal() {
        let empty: [&str; 0] = [];
        assert_eq!(format_file_list_literal(&empty), "@()");
    }

    #[test]
    fn list_literal_quotes_each_item() {
        assert_eq!(
            format_file_list_literal(&["a.txt", "b/it's.txt"]),
            "@('a.txt';'b/it''s.txt')"
        );
    }

    #[test]
    fn invocation_has_fixed_parameter_order() {
        let invocation = build_invocation(
            &config(),
            &ResolvedFileList::new(),
            &ResolvedFileList::new(),
        );
        assert_eq!(
            invocation.script(),
            "& '/opt/action/Upload-Sharefile.ps1' -ClientID 'cid' -ClientSecret 'csecret' \
             -Username 'user@example.com' -Password 'p''w' -Subdomain 'acme' \
             -ApplicationControlPlane 'sharefile.com' -ShareParentFolderLink \
             -DestinationDirectory '/Shared/Builds' -Timeout 120000 -Files @() -Exclude @()"
        );
    }

    #[test]
    fn redacted_rendering_hides_credentials() {
        let invocation = build_invocation(
            &config(),
            &ResolvedFileList::new(),
            &ResolvedFileList::new(),
        );
        let shown = format!("{invocation} {invocation:?}");
        for secret in ["cid", "csecret", "user@example.com", "p''w"] {
            assert!(!shown.contains(secret), "{secret} leaked into {shown}");
        }
        assert!(invocation.redacted().contains("-Password '***'"));
        assert!(invocation.redacted().contains("-Subdomain 'acme'"));
    }

    #[test]
    fn shell_args_end_with_script() {
        let invocation = build_invocation(
            &config(),
            &ResolvedFileList::new(),
            &ResolvedFileList::new(),
        );
        let args = invocation.shell_args(ShellKind::WindowsPowerShell);
        assert_eq!(args[0], "-NoLogo");
        assert_eq!(args[1], "-Sta");
        assert_eq!(args.last().map(String::as_str), Some(invocation.script()));

        let core_args = invocation.shell_args(ShellKind::PowerShellCore);
        assert!(!core_args.iter().any(|a| a == "-Sta"));
        assert_eq!(core_args[core_args.len() - 2], "-Command");
    }
}
