//! Commands that work without a server.

use std::path::Path;
use std::sync::Arc;

use desk_nav::permissions::{FileSnapshotSource, PermissionStore, SlugIndex};
use desk_nav::route::{get_route, ModuleSidebarLink, RouteTable};
use desk_nav::sidebar::resolve_sidebar;
use desk_nav::slug;

use crate::cli::LinkArgs;
use crate::style;

pub fn run_slug(names: &[String]) {
    for name in names {
        println!("{name} -> {}", style::accent(slug(name).as_str()));
    }
}

pub fn run_route(
    routes: &RouteTable,
    module: &str,
    args: LinkArgs,
    json: bool,
) -> anyhow::Result<()> {
    if args.workspace.is_none() && args.link_type.is_none() {
        anyhow::bail!("--workspace or --link-type/--link-to required");
    }
    let link = ModuleSidebarLink {
        workspace: args.workspace.map(Into::into),
        link_type: args.link_type.map(Into::into),
        link_to: args.link_to.map(Into::into),
        label: None,
    };
    let Some(route) = get_route(&link, module)? else {
        println!("{}", style::dim("no route"));
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&route)?);
        return Ok(());
    }
    println!("{route}");
    println!("{}", style::accent(routes.href(&route)?));
    Ok(())
}

pub fn load_index(snapshot: &Path) -> anyhow::Result<SlugIndex> {
    let store = PermissionStore::new(Arc::new(FileSnapshotSource::new(snapshot)));
    store.refresh()?;
    let index = store.index().clone();
    Ok(index)
}

pub fn load_links(path: &Path) -> anyhow::Result<Vec<ModuleSidebarLink>> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("{}: {err}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

pub fn print_index(index: &SlugIndex, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(index)?);
        return Ok(());
    }
    print_section(
        "modules",
        index
            .modules_by_slug
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );
    print_section(
        "workspaces",
        index
            .workspaces_by_slug
            .iter()
            .map(|(k, v)| (k.as_str(), v.name.as_str())),
    );
    print_section(
        "doctypes",
        index
            .doctypes_by_slug
            .iter()
            .map(|(k, v)| (k.as_str(), v.name.as_str())),
    );
    print_section(
        "reports",
        index
            .reports_by_slug
            .iter()
            .map(|(k, v)| (k.as_str(), v.title.as_str())),
    );
    Ok(())
}

fn print_section<'a>(title: &str, entries: impl Iterator<Item = (&'a str, &'a str)>) {
    println!("{}", style::success(title));
    let mut empty = true;
    for (slug, name) in entries {
        println!("  {} -> {name}", style::accent(slug));
        empty = false;
    }
    if empty {
        println!("  {}", style::dim("(none)"));
    }
}

pub fn print_sidebar(
    routes: &RouteTable,
    module: &str,
    links: &[ModuleSidebarLink],
    index: &SlugIndex,
) -> anyhow::Result<()> {
    let entries = resolve_sidebar(links, module, index);
    if entries.is_empty() {
        println!("{}", style::dim("(no visible entries)"));
    }
    for entry in entries {
        println!("{} {}", entry.label, style::accent(routes.href(&entry.route)?));
    }
    Ok(())
}
