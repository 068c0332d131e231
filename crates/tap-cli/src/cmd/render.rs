//! Homebrew formula rendering.
//!
//! Emits the Ruby formula Homebrew would read for the same release, so a
//! tap can be published to `brew` users from the TOML documents.

use anyhow::Result;
use tap_schema::{Arch, Formula, InstallRule, Os, ReleaseAsset};

use super::Context;

/// Print the Ruby formula for `spec`.
pub fn render(ctx: &Context, spec: &str) -> Result<()> {
    let formula = ctx.load(spec)?;
    print!("{}", to_ruby(&formula));
    Ok(())
}

/// Render `formula` as a Homebrew Ruby formula.
pub fn to_ruby(formula: &Formula) -> String {
    let meta = &formula.formula;
    let mut lines = vec![
        "# typed: false".to_string(),
        "# frozen_string_literal: true".to_string(),
        String::new(),
    ];

    if let Some(tool) = &meta.generated_by {
        lines.push(format!("# This file was generated by {tool}. DO NOT EDIT."));
    }
    lines.push(format!("class {} < Formula", meta.name.class_name()));
    if !meta.desc.is_empty() {
        lines.push(format!("  desc {}", quote(&meta.desc)));
    }
    if !meta.homepage.is_empty() {
        lines.push(format!("  homepage {}", quote(&meta.homepage)));
    }
    lines.push(format!("  version {}", quote(meta.version.as_str())));
    if let Some(license) = &meta.license {
        lines.push(format!("  license {}", quote(license)));
    }

    for os in [Os::Macos, Os::Linux] {
        let block = os_block(formula, os);
        if !block.is_empty() {
            lines.push(String::new());
            lines.push(format!("  on_{} do", os.as_str()));
            lines.extend(block);
            lines.push("  end".to_string());
        }
    }

    let mut system = vec![quote(&format!("#{{bin}}/{}", formula.test_bin()))];
    system.extend(formula.test.args.iter().map(|a| quote(a)));
    lines.push(String::new());
    lines.push("  test do".to_string());
    lines.push(format!("    system {}", system.join(", ")));
    lines.push("  end".to_string());
    lines.push("end".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Per-architecture branches inside one `on_<os>` block.
fn os_block(formula: &Formula, os: Os) -> Vec<String> {
    let mut lines = Vec::new();

    for arch in [Arch::X86_64, Arch::Arm64] {
        let platform = tap_schema::Platform::new(os, arch);
        let predicate = format!("    if Hardware::CPU.{}", arch.homebrew_predicate());

        if let Some(asset) = formula.asset_for(platform) {
            lines.push(predicate);
            push_asset(&mut lines, formula, asset);
            lines.push("    end".to_string());
        } else if let Some(fallback) = formula.fallback_for(platform) {
            // Validation guarantees the fallback target has an asset.
            let Some(asset) = formula.asset_for(fallback.target()) else {
                continue;
            };
            lines.push(predicate);
            lines.push("      def caveats".to_string());
            lines.push("        <<~EOS".to_string());
            for line in fallback.caveat.trim().lines() {
                lines.push(format!("          {}", line.trim_end()));
            }
            lines.push("        EOS".to_string());
            lines.push("      end".to_string());
            lines.push(String::new());
            push_asset(&mut lines, formula, asset);
            lines.push("    end".to_string());
        }
    }

    lines
}

/// `url`, `sha256` and `def install` for one asset.
fn push_asset(lines: &mut Vec<String>, formula: &Formula, asset: &ReleaseAsset) {
    lines.push(format!("      url {}", quote(&asset.url)));
    lines.push(format!("      sha256 {}", quote(asset.sha256.as_str())));
    lines.push(String::new());
    lines.push("      def install".to_string());
    for rule in asset.effective_install(formula.name()) {
        lines.push(format!("        bin.install {}", install_args(&rule)));
    }
    lines.push("      end".to_string());
}

fn install_args(rule: &InstallRule) -> String {
    let from = quote(&rule.from);
    match &rule.to {
        Some(to) if to != source_file_name(rule) => format!("{from} => {}", quote(to)),
        _ => from,
    }
}

/// Double-quoted Ruby string literal. `#{bin}` is kept as interpolation.
fn quote(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("#{", "\\#{")
        .replace("\\#{bin}", "#{bin}");
    format!("\"{escaped}\"")
}

/// File name of `from`, ignoring any rename.
fn source_file_name(rule: &InstallRule) -> &str {
    std::path::Path::new(&rule.from)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(&rule.from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const V201: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../Formula/proton/2.0.1.toml"
    ));
    const V210: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../tap-core/tests/fixtures/proton-2.1.0.toml"
    ));

    #[test]
    fn renders_goreleaser_formula() {
        let ruby = to_ruby(&Formula::parse(V201).unwrap());

        assert!(ruby.contains("# This file was generated by GoReleaser. DO NOT EDIT.\n"));
        assert!(ruby.contains("class Proton < Formula\n"));
        assert!(ruby.contains("  desc \"cli protobuf to json converter\"\n"));
        assert!(ruby.contains("  version \"2.0.1\"\n"));
        assert!(ruby.contains(
            "  on_macos do\n    if Hardware::CPU.intel?\n      url \"https://github.com/beatlabs/proton/releases/download/v2.0.1/proton_Darwin_x86_64.tar.gz\"\n"
        ));
        assert!(ruby.contains(
            "sha256 \"5e917e5d22c75dd6362eea013023d353258a52aa5fd55351029abed245d144b9\""
        ));
        assert!(ruby.contains("        bin.install \"proton\"\n"));
        assert!(ruby.contains("  test do\n    system \"#{bin}/proton\"\n  end\nend\n"));
        assert!(!ruby.contains("Hardware::CPU.arm?"));
    }

    #[test]
    fn renders_fallback_as_caveat() {
        let ruby = to_ruby(&Formula::parse(V210).unwrap());

        assert!(ruby.contains("    if Hardware::CPU.arm?\n      def caveats\n        <<~EOS\n"));
        assert!(ruby.contains("          The darwin_arm64 architecture is not supported"));
        assert!(ruby.contains("        EOS\n"));

        let macos = &ruby[ruby.find("  on_macos do").unwrap()..ruby.find("  on_linux do").unwrap()];
        let arm = &macos[macos.find("if Hardware::CPU.arm?").unwrap()..];
        assert!(arm.contains(
            "      url \"https://github.com/beatlabs/proton/releases/download/v2.1.0/proton_Darwin_x86_64.tar.gz\"\n"
        ));
        assert!(arm.contains(
            "      sha256 \"1111111111111111111111111111111111111111111111111111111111111111\"\n"
        ));
        assert!(arm.contains("      def install\n        bin.install \"proton\"\n      end\n    end\n"));
    }

    #[test]
    fn no_banner_for_hand_written_formulas() {
        let hand = V201.replace("generated_by = \"GoReleaser\"\n", "");
        let ruby = to_ruby(&Formula::parse(&hand).unwrap());
        assert!(!ruby.contains("DO NOT EDIT"));
    }

    #[test]
    fn renamed_install_and_test_args() {
        let rule = InstallRule {
            from: "dist/proton-cli".to_string(),
            to: Some("proton".to_string()),
        };
        assert_eq!(install_args(&rule), "\"dist/proton-cli\" => \"proton\"");
        assert_eq!(install_args(&InstallRule::new("bin/proton")), "\"bin/proton\"");

        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote("#{bin}/proton"), "\"#{bin}/proton\"");
        assert_eq!(quote("#{evil}"), "\"\\#{evil}\"");
    }
}
