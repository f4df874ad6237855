use std::collections::HashMap;

use super::types::{MenuGroups, MenuItem, ModulePackage, SYSTEM_MENU_GROUP, WECHAT_MENU_GROUP};

/// 路由解析：根据路由名和参数生成访问路径
pub trait RouteResolver: Send + Sync {
    fn route(&self, name: &str, params: &[(&str, &str)]) -> String;
}

/// 命名路由表
///
/// 模板中的 `{param}` 由同名参数替换，剩余参数按顺序拼接为查询字符串。
/// 未登记的路由名按 `a.b.c` → `/a/b/c` 生成。
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<String, String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert("module.config.edit", "/module/config/{module}/edit");
        table.insert("module.domain.create", "/module/domain/create");
        table.insert("module.menu.lists", "/module/menu/lists");
        table
    }
}

impl RouteTable {
    pub fn empty() -> Self {
        Self { routes: HashMap::new() }
    }

    pub fn insert(&mut self, name: &str, template: &str) {
        self.routes.insert(name.to_string(), template.to_string());
    }
}

impl RouteResolver for RouteTable {
    fn route(&self, name: &str, params: &[(&str, &str)]) -> String {
        let mut path = match self.routes.get(name) {
            Some(template) => template.clone(),
            None => format!("/{}", name.replace('.', "/")),
        };

        let mut query = Vec::new();
        for (key, value) in params {
            let placeholder = format!("{{{}}}", key);
            if path.contains(&placeholder) {
                path = path.replace(&placeholder, value);
            } else {
                query.push(format!("{}={}", key, value));
            }
        }

        if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, query.join("&"))
        }
    }
}

/// 附加菜单的链接来源
#[derive(Debug, Clone, Copy)]
enum MenuTarget {
    /// 以模块标识作为 `module` 参数的命名路由
    ModuleRoute(&'static str),
    Route(&'static str, &'static [(&'static str, &'static str)]),
    Literal(&'static str),
}

/// 由功能开关派生的一条菜单
#[derive(Debug, Clone, Copy)]
pub struct DerivedMenu {
    pub flag: &'static str,
    pub group: &'static str,
    pub title: &'static str,
    pub permission: &'static str,
    target: MenuTarget,
}

impl DerivedMenu {
    pub fn item(&self, module: &str, routes: &dyn RouteResolver) -> MenuItem {
        let url = match self.target {
            MenuTarget::ModuleRoute(name) => routes.route(name, &[("module", module)]),
            MenuTarget::Route(name, params) => routes.route(name, params),
            MenuTarget::Literal(url) => url.to_string(),
        };
        MenuItem::new(self.title, url, self.permission)
    }
}

/// 派生菜单表，按此顺序追加
pub const DERIVED_MENUS: [DerivedMenu; 6] = [
    DerivedMenu {
        flag: "config",
        group: SYSTEM_MENU_GROUP,
        title: "参数设置",
        permission: "config",
        target: MenuTarget::ModuleRoute("module.config.edit"),
    },
    DerivedMenu {
        flag: "domain",
        group: SYSTEM_MENU_GROUP,
        title: "域名管理",
        permission: "domain",
        target: MenuTarget::Route("module.domain.create", &[]),
    },
    DerivedMenu {
        flag: "menu_mobile",
        group: SYSTEM_MENU_GROUP,
        title: "手机会员中心菜单",
        permission: "menu_mobile",
        target: MenuTarget::Route("module.menu.lists", &[("type", "mobile")]),
    },
    DerivedMenu {
        flag: "menu_web",
        group: SYSTEM_MENU_GROUP,
        title: "桌面会员中心菜单",
        permission: "menu_web",
        target: MenuTarget::Route("module.menu.lists", &[("type", "web")]),
    },
    DerivedMenu {
        flag: "wx_replies",
        group: WECHAT_MENU_GROUP,
        title: "微信回复列表",
        permission: "wx_replies",
        target: MenuTarget::Literal("wx_replies"),
    },
    DerivedMenu {
        flag: "wx_cover",
        group: WECHAT_MENU_GROUP,
        title: "微信封面入口",
        permission: "wx_cover",
        target: MenuTarget::Literal("wx_entry"),
    },
];

/// 根据 package 的功能开关追加系统菜单
///
/// 只追加不去重，同一份菜单调用两次会产生重复项。
/// 每次派生前应从定义文件重新加载菜单。
pub fn format_menus(package: &ModulePackage, menus: &mut MenuGroups, routes: &dyn RouteResolver) {
    for derived in &DERIVED_MENUS {
        if package.flag(derived.flag) {
            menus.push(derived.group, derived.item(&package.name, routes));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::types::FEATURE_FLAGS;
    use serde_json::{json, Map, Value};

    fn package_with(flags: &[&str]) -> ModulePackage {
        let mut attributes = Map::new();
        attributes.insert("name".to_string(), json!("Edu"));
        for flag in flags {
            attributes.insert(flag.to_string(), Value::Bool(true));
        }
        ModulePackage::template().merged(&attributes).unwrap()
    }

    #[test]
    fn test_route_table() {
        let routes = RouteTable::default();
        assert_eq!(routes.route("module.config.edit", &[("module", "Edu")]), "/module/config/Edu/edit");
        assert_eq!(routes.route("module.menu.lists", &[("type", "web")]), "/module/menu/lists?type=web");
        assert_eq!(routes.route("site.module.user", &[("site", "1"), ("page", "2")]), "/site/module/user?site=1&page=2");
    }

    #[test]
    fn test_each_flag_adds_its_entry() {
        let routes = RouteTable::default();
        for derived in &DERIVED_MENUS {
            let mut menus = MenuGroups::new();
            format_menus(&package_with(&[derived.flag]), &mut menus, &routes);

            let items = menus.group(derived.group).unwrap();
            assert_eq!(items.len(), 1, "flag {}", derived.flag);
            assert_eq!(items[0].permission, derived.flag);
            assert_eq!(menus.items().count(), 1);
        }
    }

    #[test]
    fn test_no_flags_no_entries() {
        let mut menus = MenuGroups::new();
        format_menus(&package_with(&[]), &mut menus, &RouteTable::default());
        assert!(menus.is_empty());
    }

    #[test]
    fn test_all_flags_in_fixed_order() {
        let routes = RouteTable::default();
        let mut menus = MenuGroups::new();
        menus.push("课程管理", MenuItem::new("课程列表", "/edu/lesson", "lesson"));

        format_menus(&package_with(&FEATURE_FLAGS), &mut menus, &routes);

        let groups: Vec<&str> = menus.groups().map(|(name, _)| name).collect();
        assert_eq!(groups, vec!["课程管理", SYSTEM_MENU_GROUP, WECHAT_MENU_GROUP]);

        let system: Vec<&str> = menus
            .group(SYSTEM_MENU_GROUP)
            .unwrap()
            .iter()
            .map(|item| item.permission.as_str())
            .collect();
        assert_eq!(system, vec!["config", "domain", "menu_mobile", "menu_web"]);

        let wechat = menus.group(WECHAT_MENU_GROUP).unwrap();
        assert_eq!(wechat[0].url, "wx_replies");
        assert_eq!(wechat[1].url, "wx_entry");

        let config = &menus.group(SYSTEM_MENU_GROUP).unwrap()[0];
        assert_eq!(config.url, "/module/config/Edu/edit");
    }

    #[test]
    fn test_formatting_twice_duplicates_entries() {
        let routes = RouteTable::default();
        let package = package_with(&["config", "wx_replies"]);
        let mut menus = MenuGroups::new();

        format_menus(&package, &mut menus, &routes);
        format_menus(&package, &mut menus, &routes);

        assert_eq!(menus.group(SYSTEM_MENU_GROUP).unwrap().len(), 2);
        assert_eq!(menus.group(WECHAT_MENU_GROUP).unwrap().len(), 2);
    }
}
