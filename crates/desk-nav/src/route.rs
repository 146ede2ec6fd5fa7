//! Sidebar link to route resolution and route templates.

#![allow(missing_docs)]

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::NavError;
use crate::slug::{slug, try_slug, Slug};

/// Sidebar entry as delivered by the server.
///
/// Either `workspace` is set, or `link_type` and `link_to` are. The link type
/// stays raw text so unknown kinds resolve to no route instead of failing to
/// decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSidebarLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_to: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<SmolStr>,
}

impl ModuleSidebarLink {
    #[must_use]
    pub fn workspace(name: impl Into<SmolStr>) -> Self {
        Self {
            workspace: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn to(link_type: impl Into<SmolStr>, link_to: impl Into<SmolStr>) -> Self {
        Self {
            link_type: Some(link_type.into()),
            link_to: Some(link_to.into()),
            ..Self::default()
        }
    }

    /// Text shown for the entry: the label, else the target name.
    #[must_use]
    pub fn display(&self) -> &str {
        self.label
            .as_deref()
            .or(self.workspace.as_deref())
            .or(self.link_to.as_deref())
            .unwrap_or("")
    }
}

/// Link kinds the resolver knows how to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    DocType,
    Page,
    Report,
    Dashboard,
}

impl LinkType {
    /// Exact, case-sensitive match on the server's link type text.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "DocType" => Some(Self::DocType),
            "Page" => Some(Self::Page),
            "Report" => Some(Self::Report),
            "Dashboard" => Some(Self::Dashboard),
            _ => None,
        }
    }
}

/// Named views in the desk route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RouteName {
    Workspace,
    ListView,
    Page,
    Report,
    Dashboard,
    Login,
}

impl RouteName {
    pub const ALL: [RouteName; 6] = [
        RouteName::Workspace,
        RouteName::ListView,
        RouteName::Page,
        RouteName::Report,
        RouteName::Dashboard,
        RouteName::Login,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RouteName::Workspace => "Workspace",
            RouteName::ListView => "ListView",
            RouteName::Page => "Page",
            RouteName::Report => "Report",
            RouteName::Dashboard => "Dashboard",
            RouteName::Login => "Login",
        }
    }

    /// Accepts `ListView`, `listview` and `list_view` alike.
    pub fn parse(text: &str) -> Result<Self, NavError> {
        let key = text.trim().to_ascii_lowercase().replace(['_', '-'], "");
        match key.as_str() {
            "workspace" => Ok(Self::Workspace),
            "listview" => Ok(Self::ListView),
            "page" => Ok(Self::Page),
            "report" => Ok(Self::Report),
            "dashboard" => Ok(Self::Dashboard),
            "login" => Ok(Self::Login),
            _ => Err(NavError::InvalidArgument(
                format!("unknown route '{text}'").into(),
            )),
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub name: RouteName,
    pub params: IndexMap<SmolStr, Slug>,
}

impl Route {
    #[must_use]
    pub fn new(name: RouteName) -> Self {
        Self {
            name,
            params: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: &str, value: Slug) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&Slug> {
        self.params.get(key)
    }

    #[must_use]
    pub fn login() -> Self {
        Self::new(RouteName::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        let mut first = true;
        for (key, value) in &self.params {
            let sep = if first { " " } else { ", " };
            write!(f, "{sep}{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Resolve a sidebar link inside `module` to a route.
///
/// Workspace links win over typed links; an empty `workspace` counts as
/// unset. Unknown or absent link types give `Ok(None)`. A typed link without
/// `link_to`, or a page/report/dashboard link with an empty `module`, is an
/// error. Single doctypes route to the list view like any other doctype.
pub fn get_route(link: &ModuleSidebarLink, module: &str) -> Result<Option<Route>, NavError> {
    if let Some(workspace) = link.workspace.as_deref().filter(|name| !name.is_empty()) {
        return Ok(Some(
            Route::new(RouteName::Workspace).with_param("workspace", slug(workspace)),
        ));
    }
    let Some(kind) = link.link_type.as_deref().and_then(LinkType::parse) else {
        return Ok(None);
    };
    let target = try_slug(link.link_to.as_deref()).map_err(|_| {
        NavError::InvalidArgument(format!("{kind:?} link without link_to").into())
    })?;
    let route = match kind {
        LinkType::DocType => Route::new(RouteName::ListView).with_param("doctype", target),
        LinkType::Page | LinkType::Report | LinkType::Dashboard => {
            let name = match kind {
                LinkType::Page => RouteName::Page,
                LinkType::Report => RouteName::Report,
                _ => RouteName::Dashboard,
            };
            let module = try_slug(Some(module)).map_err(|_| {
                NavError::InvalidArgument(format!("{kind:?} link outside a module").into())
            })?;
            Route::new(name)
                .with_param("module", module)
                .with_param("id", target)
        }
    };
    Ok(Some(route))
}

/// Path templates per route name. `:param` segments are filled from
/// [`Route::params`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    templates: IndexMap<RouteName, SmolStr>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let templates = RouteName::ALL
            .into_iter()
            .map(|name| (name, SmolStr::new(default_template(name))))
            .collect();
        Self { templates }
    }
}

fn default_template(name: RouteName) -> &'static str {
    match name {
        RouteName::Workspace => "/:workspace",
        RouteName::ListView => "/list/:doctype",
        RouteName::Page => "/:module/page/:id",
        RouteName::Report => "/:module/report/:id",
        RouteName::Dashboard => "/:module/dashboard/:id",
        RouteName::Login => "/login",
    }
}

impl RouteTable {
    pub fn set(&mut self, name: RouteName, template: &str) -> Result<(), NavError> {
        let template = template.trim();
        if !template.starts_with('/') {
            return Err(NavError::InvalidConfig(
                format!("route template for {name} must start with '/': '{template}'").into(),
            ));
        }
        if template.split('/').any(|segment| segment == ":") {
            return Err(NavError::InvalidConfig(
                format!("route template for {name} has an unnamed parameter").into(),
            ));
        }
        self.templates.insert(name, template.into());
        Ok(())
    }

    #[must_use]
    pub fn template(&self, name: RouteName) -> &str {
        self.templates
            .get(&name)
            .map_or_else(|| default_template(name), SmolStr::as_str)
    }

    /// Render a route to a path. Missing parameters are an error; extra
    /// parameters are ignored.
    pub fn href(&self, route: &Route) -> Result<String, NavError> {
        let template = self.template(route.name);
        let mut out = String::with_capacity(template.len() + 16);
        for (idx, segment) in template.split('/').enumerate() {
            if idx > 0 {
                out.push('/');
            }
            match segment.strip_prefix(':') {
                Some(key) => {
                    let value = route.param(key).ok_or_else(|| {
                        NavError::InvalidArgument(
                            format!("route {} is missing param '{key}'", route.name).into(),
                        )
                    })?;
                    out.push_str(value.as_str());
                }
                None => out.push_str(segment),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_branch() {
        let route = get_route(&ModuleSidebarLink::workspace("Accounts"), "any")
            .unwrap()
            .unwrap();
        assert_eq!(
            route,
            Route::new(RouteName::Workspace).with_param("workspace", slug("Accounts"))
        );
    }

    #[test]
    fn workspace_wins_over_link_type() {
        let mut link = ModuleSidebarLink::to("Report", "Balance Sheet");
        link.workspace = Some("Finance Home".into());
        let route = get_route(&link, "Accounts").unwrap().unwrap();
        assert_eq!(route.name, RouteName::Workspace);
        assert_eq!(route.param("workspace").unwrap(), "finance-home");
    }

    #[test]
    fn doctype_branch() {
        let route = get_route(&ModuleSidebarLink::to("DocType", "Sales Invoice"), "Accounts")
            .unwrap()
            .unwrap();
        assert_eq!(
            route,
            Route::new(RouteName::ListView).with_param("doctype", slug("Sales Invoice"))
        );
    }

    #[test]
    fn module_scoped_branches() {
        let route = get_route(&ModuleSidebarLink::to("Report", "Profit and Loss"), "Accounts")
            .unwrap()
            .unwrap();
        assert_eq!(
            route,
            Route::new(RouteName::Report)
                .with_param("module", slug("accounts"))
                .with_param("id", slug("profit-and-loss"))
        );
        let page = get_route(&ModuleSidebarLink::to("Page", "Point of Sale"), "Selling")
            .unwrap()
            .unwrap();
        assert_eq!(page.name, RouteName::Page);
        assert_eq!(page.param("id").unwrap(), "point-of-sale");
        let dash = get_route(&ModuleSidebarLink::to("Dashboard", "Stock"), "Stock")
            .unwrap()
            .unwrap();
        assert_eq!(dash.name, RouteName::Dashboard);
        assert_eq!(dash.param("module").unwrap(), "stock");
    }

    #[test]
    fn unroutable_links_give_none() {
        assert_eq!(get_route(&ModuleSidebarLink::default(), "Accounts"), Ok(None));
        assert_eq!(
            get_route(&ModuleSidebarLink::to("URL", "https://example.com"), "Accounts"),
            Ok(None)
        );
        assert_eq!(
            get_route(&ModuleSidebarLink::to("doctype", "Item"), "Stock"),
            Ok(None)
        );
    }

    #[test]
    fn typed_link_without_target_fails() {
        let link = ModuleSidebarLink {
            link_type: Some("DocType".into()),
            ..ModuleSidebarLink::default()
        };
        assert!(matches!(
            get_route(&link, "Accounts"),
            Err(NavError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_workspace_falls_through_to_link_type() {
        let mut link = ModuleSidebarLink::to("DocType", "Sales Invoice");
        link.workspace = Some("".into());
        let route = get_route(&link, "Accounts").unwrap().unwrap();
        assert_eq!(route.name, RouteName::ListView);
        assert_eq!(route.param("doctype").unwrap(), "sales-invoice");

        let bare = ModuleSidebarLink {
            workspace: Some("".into()),
            ..ModuleSidebarLink::default()
        };
        assert_eq!(get_route(&bare, "Accounts"), Ok(None));
    }

    #[test]
    fn module_scoped_link_needs_a_module() {
        for link_type in ["Page", "Report", "Dashboard"] {
            assert!(matches!(
                get_route(&ModuleSidebarLink::to(link_type, "POS"), ""),
                Err(NavError::InvalidArgument(_))
            ));
        }
        let list = get_route(&ModuleSidebarLink::to("DocType", "Item"), "").unwrap();
        assert_eq!(list.unwrap().name, RouteName::ListView);
    }

    #[test]
    fn default_table_renders_hrefs() {
        let table = RouteTable::default();
        let report = Route::new(RouteName::Report)
            .with_param("module", slug("Accounts"))
            .with_param("id", slug("General Ledger"));
        assert_eq!(table.href(&report).unwrap(), "/accounts/report/general-ledger");
        assert_eq!(table.href(&Route::login()).unwrap(), "/login");
        let list = Route::new(RouteName::ListView).with_param("doctype", slug("Sales Order"));
        assert_eq!(table.href(&list).unwrap(), "/list/sales-order");
    }

    #[test]
    fn href_requires_template_params() {
        let table = RouteTable::default();
        let err = table.href(&Route::new(RouteName::Workspace)).unwrap_err();
        assert!(matches!(err, NavError::InvalidArgument(_)));
    }

    #[test]
    fn custom_templates_validate() {
        let mut table = RouteTable::default();
        table.set(RouteName::ListView, "/app/:doctype").unwrap();
        let list = Route::new(RouteName::ListView).with_param("doctype", slug("Item"));
        assert_eq!(table.href(&list).unwrap(), "/app/item");
        assert!(table.set(RouteName::Page, "page/:id").is_err());
        assert!(table.set(RouteName::Page, "/page/:").is_err());
    }

    #[test]
    fn route_names_parse_loosely() {
        assert_eq!(RouteName::parse("list_view"), Ok(RouteName::ListView));
        assert_eq!(RouteName::parse("ListView"), Ok(RouteName::ListView));
        assert_eq!(RouteName::parse(" login "), Ok(RouteName::Login));
        assert!(RouteName::parse("form").is_err());
    }
}
