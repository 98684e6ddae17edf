// Swap activation via external mkswap/swapon commands
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;

use log::{info, warn};

use crate::helpers::run_shell;

/// Substitute the swap file path into a command template
pub fn render_template(template: &str, swapfile: &Path) -> String {
    template.replace("{swapfile}", &swapfile.to_string_lossy())
}

/// Format and enable the swap file by running the configured command
/// templates. Failures here are logged and swallowed: the initialization
/// pipeline always continues to offset registration, whose own swap-table
/// lookup fails safely if activation never actually happened.
pub fn activate(swapfile: &Path, mkswap_template: &str, swapon_template: &str) {
    for (stage, template) in [("mkswap", mkswap_template), ("swapon", swapon_template)] {
        let cmdline = render_template(template, swapfile);
        info!("{}: {}", stage, cmdline);
        match run_shell(&cmdline) {
            Ok(true) => {}
            Ok(false) => warn!("{} failed, continuing anyway: {}", stage, cmdline),
            Err(e) => warn!("{} could not run ({}), continuing anyway", stage, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_substituted_everywhere() {
        let cmd = render_template("mkswap {swapfile} && touch {swapfile}.done", Path::new("/swap"));
        assert_eq!(cmd, "mkswap /swap && touch /swap.done");
    }

    #[test]
    fn template_without_placeholder_is_untouched() {
        assert_eq!(
            render_template("systemctl hibernate", Path::new("/swap")),
            "systemctl hibernate"
        );
    }

    #[test]
    fn failing_commands_are_swallowed() {
        // both stages fail; activate must not panic or propagate
        activate(Path::new("/swap"), "false", "false");
    }
}
