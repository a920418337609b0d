//! Render command: print rendered templates without touching their outputs

use colored::Colorize;
use futures::future::join_all;
use vaulty_core::Context;

use super::{fail_on_errors, print_section, split_patterns};
use crate::error::Result;

/// Run the render command
///
/// A single template is printed as-is so it can be piped. Several templates
/// are printed one section each.
pub async fn run_render(ctx: &Context, patterns: &[String]) -> Result<()> {
    let names = ctx.find_templates(&split_patterns(patterns))?;

    if names.is_empty() {
        eprintln!("{}", "No templates found".dimmed());
        return Ok(());
    }

    let rendered = join_all(names.iter().map(|name| ctx.render_template(name))).await;
    let sections = names.len() > 1;

    for (index, (name, content)) in names.iter().zip(rendered).enumerate() {
        let Ok(content) = content else {
            continue;
        };
        if sections {
            if index > 0 {
                println!();
            }
            print_section(name);
        }
        print!("{content}");
    }

    fail_on_errors(ctx)
}
