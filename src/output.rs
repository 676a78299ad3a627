use std::io::{self, Write};

use serde::Serialize;

use crate::app::ListResult;
use crate::tree::{CategoryNode, CategoryTree, Node};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_tree(tree: &CategoryTree) -> io::Result<()> {
        Self::print_json(tree)
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_tree(tree: &CategoryTree) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        Self::write_tree(&mut stdout, tree)
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        Self::write_list(&mut stdout, result)
    }

    pub fn write_tree<W: Write>(out: &mut W, tree: &CategoryTree) -> io::Result<()> {
        write_category(out, tree.root(), 0)
    }

    pub fn write_list<W: Write>(out: &mut W, result: &ListResult) -> io::Result<()> {
        for descriptor in &result.datasets {
            let id = descriptor.table_id().unwrap_or("?");
            match &descriptor.updated {
                Some(updated) => writeln!(
                    out,
                    "{id}  {}  (updated {updated})",
                    descriptor.title()
                )?,
                None => writeln!(out, "{id}  {}", descriptor.title())?,
            }
            let counts = descriptor
                .var_counts
                .iter()
                .map(Some)
                .chain(std::iter::repeat(None));
            for (var, count) in descriptor.vars.iter().zip(counts) {
                match count {
                    Some(count) => writeln!(out, "    {var} ({count})")?,
                    None => writeln!(out, "    {var}")?,
                }
            }
        }
        Ok(())
    }
}

fn write_category<W: Write>(
    out: &mut W,
    category: &CategoryNode,
    depth: usize,
) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    for (label, node) in category.children() {
        match node {
            Node::Category(child) => {
                writeln!(out, "{indent}{label}/")?;
                write_category(out, child, depth + 1)?;
            }
            Node::Leaf(leaf) => writeln!(out, "{indent}{label}  [{}]", leaf.locator())?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::DatasetDescriptor;

    #[test]
    fn tree_text_is_indented() {
        let paths = vec![
            vec!["Majandus", "10Ehitus", "a.asp"],
            vec!["Majandus", "20Energia", "01Hinnad", "b.asp"],
        ];
        let tree = CategoryTree::build(&paths).unwrap();
        let mut buf = Vec::new();
        TextOutput::write_tree(&mut buf, &tree).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Majandus/\n  Ehitus  [Majandus/10Ehitus/a.asp]\n  Energia/\n    Hinnad  [Majandus/20Energia/01Hinnad/b.asp]\n"
        );
    }

    #[test]
    fn list_text_tolerates_missing_counts() {
        let result = ListResult {
            locator: "x".to_string(),
            datasets: vec![DatasetDescriptor {
                name: "101: Hinnad".to_string(),
                url: String::new(),
                updated: None,
                var_counts: vec![3],
                vars: vec!["Aasta".to_string(), "Maakond".to_string()],
            }],
        };
        let mut buf = Vec::new();
        TextOutput::write_list(&mut buf, &result).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "101  Hinnad\n    Aasta (3)\n    Maakond\n");
    }
}
