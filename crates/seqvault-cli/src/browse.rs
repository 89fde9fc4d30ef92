//! The `browse` command: one directory level printed to stdout.

use std::io::{self, Write};

use seqvault_explorer::{FileTree, HttpListingClient, NodeKind, TracingNotifier};

use crate::TRACING_TARGET_BROWSE;
use crate::config::BrowseConfig;

/// Opens the configured tree, navigates to the requested folder and prints it.
pub async fn run(config: BrowseConfig) -> anyhow::Result<()> {
    let tree_config = config.tree_config()?;
    let client = HttpListingClient::new(config.client)?;

    let mut tree = FileTree::open(client.into_service(), TracingNotifier, tree_config).await;

    if let Some(path) = config.path.as_deref() {
        let depth = tree.navigate(path).await;
        tracing::debug!(
            target: TRACING_TARGET_BROWSE,
            path = %path,
            depth,
            "Navigated"
        );
    }

    let mut stdout = io::stdout().lock();
    render(&tree, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Writes the breadcrumbs and the children of the current directory.
fn render(tree: &FileTree, out: &mut impl Write) -> io::Result<()> {
    let breadcrumbs: Vec<_> = tree.path().iter().map(|node| node.name.as_str()).collect();
    writeln!(out, "{}", breadcrumbs.join(" / "))?;

    let current = tree.current();
    if current.children().is_empty() {
        return writeln!(out, "  (empty)");
    }

    for node in current.children() {
        match node.kind {
            NodeKind::Directory => writeln!(out, "  {:>12}  {}/", "-", node.name)?,
            NodeKind::File => {
                let size = node.size.map_or_else(|| "?".to_owned(), |size| size.to_string());
                writeln!(out, "  {size:>12}  {}", node.name)?;
            }
        }
    }

    Ok(())
}
