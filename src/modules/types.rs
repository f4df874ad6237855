use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::database::entities::module;

/// 系统功能菜单分组
pub const SYSTEM_MENU_GROUP: &str = "系统功能";

/// 微信回复菜单分组
pub const WECHAT_MENU_GROUP: &str = "微信回复";

/// package 中控制附加菜单的功能开关
pub const FEATURE_FLAGS: [&str; 6] = ["config", "domain", "menu_mobile", "menu_web", "wx_replies", "wx_cover"];

/// 模块包信息（package.json）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModulePackage {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub name: String,
    /// 其余元信息，包括功能开关
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

impl ModulePackage {
    /// 新模块的初始包信息，所有功能开关关闭
    pub fn template() -> Self {
        let mut meta = Map::new();
        meta.insert("version".to_string(), Value::String("1.0".to_string()));
        meta.insert("author".to_string(), Value::String(String::new()));
        meta.insert("description".to_string(), Value::String(String::new()));
        for flag in FEATURE_FLAGS {
            meta.insert(flag.to_string(), Value::Bool(false));
        }
        Self {
            title: String::new(),
            name: String::new(),
            meta,
        }
    }

    /// 功能开关是否开启
    pub fn flag(&self, key: &str) -> bool {
        self.meta.get(key).is_some_and(is_truthy)
    }

    /// 以 `attributes` 覆盖当前字段，返回合并后的包信息
    pub fn merged(&self, attributes: &Map<String, Value>) -> serde_json::Result<Self> {
        let mut fields = match serde_json::to_value(self)? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        for (key, value) in attributes {
            fields.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(fields))
    }
}

/// 开关值的宽松判断：`"0"`、`"false"`、空字符串、0 与 null 视为关闭
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// 菜单项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub title: String,
    pub url: String,
    pub permission: String,
}

impl MenuItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            permission: permission.into(),
        }
    }
}

/// 按分组组织的菜单，分组与分组内菜单都保持声明顺序
///
/// 序列化为 `{"分组": [菜单...]}`，空数组 `[]` 也被接受为空菜单
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuGroups(Vec<(String, Vec<MenuItem>)>);

impl MenuGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加菜单项，分组不存在时在末尾新建
    pub fn push(&mut self, group: &str, item: MenuItem) {
        match self.0.iter_mut().find(|(name, _)| name == group) {
            Some((_, items)) => items.push(item),
            None => self.0.push((group.to_string(), vec![item])),
        }
    }

    pub fn group(&self, group: &str) -> Option<&[MenuItem]> {
        self.0
            .iter()
            .find(|(name, _)| name == group)
            .map(|(_, items)| items.as_slice())
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[MenuItem])> {
        self.0.iter().map(|(name, items)| (name.as_str(), items.as_slice()))
    }

    /// 先按分组顺序、再按组内顺序遍历所有菜单项
    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.0.iter().flat_map(|(_, items)| items.iter())
    }

    /// 过滤菜单项，分组本身保留
    pub fn retain_items(&mut self, mut keep: impl FnMut(&MenuItem) -> bool) {
        for (_, items) in &mut self.0 {
            items.retain(|item| keep(item));
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<MenuItem>)> for MenuGroups {
    fn from_iter<I: IntoIterator<Item = (String, Vec<MenuItem>)>>(iter: I) -> Self {
        let mut menus = Self::new();
        for (group, items) in iter {
            for item in items {
                menus.push(&group, item);
            }
            if menus.group(&group).is_none() {
                menus.0.push((group, Vec::new()));
            }
        }
        menus
    }
}

impl Serialize for MenuGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (group, items) in &self.0 {
            map.serialize_entry(group, items)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MenuGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MenuGroupsVisitor;

        impl<'de> Visitor<'de> for MenuGroupsVisitor {
            type Value = MenuGroups;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of menu group to menu items")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut groups = Vec::new();
                while let Some((group, items)) = access.next_entry::<String, Vec<MenuItem>>()? {
                    groups.push((group, items));
                }
                Ok(groups.into_iter().collect())
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                if seq.next_element::<serde::de::IgnoredAny>()?.is_some() {
                    return Err(serde::de::Error::custom("menu list must be an object of groups"));
                }
                Ok(MenuGroups::new())
            }
        }

        deserializer.deserialize_any(MenuGroupsVisitor)
    }
}

/// 模块（对外返回的纯数据结构）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: i32,
    pub name: String,
    pub title: String,
    pub local: bool,
    pub package: ModulePackage,
    pub permissions: Vec<String>,
    pub menus: MenuGroups,
}

impl TryFrom<module::Model> for Module {
    type Error = serde_json::Error;

    fn try_from(model: module::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            title: model.title,
            local: model.local,
            package: serde_json::from_str(&model.package)?,
            permissions: serde_json::from_str(&model.permissions)?,
            menus: serde_json::from_str(&model.menus)?,
        })
    }
}

/// 安装模块的参数
///
/// `attributes` 合并进 package，必须包含 `name`
#[derive(Debug, Clone, Default)]
pub struct ModuleInstall {
    pub attributes: Map<String, Value>,
    pub permissions: Vec<String>,
    pub menus: MenuGroups,
}

impl ModuleInstall {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            attributes,
            ..Default::default()
        }
    }

    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_menus(mut self, menus: MenuGroups) -> Self {
        self.menus = menus;
        self
    }

    pub fn name(&self) -> &str {
        self.attributes.get("name").and_then(Value::as_str).unwrap_or_default()
    }
}

/// 模块标识：首字母大写，其余保持不变
pub fn normalize_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("edu"), "Edu");
        assert_eq!(normalize_name("weChat"), "WeChat");
        assert_eq!(normalize_name("Edu"), "Edu");
        assert_eq!(normalize_name("eDU_module"), "EDU_module");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_flag_truthiness() {
        let package: ModulePackage = serde_json::from_value(json!({
            "title": "教育",
            "name": "Edu",
            "config": true,
            "domain": "1",
            "menu_mobile": "0",
            "menu_web": 0,
            "wx_replies": 1,
            "wx_cover": null,
        }))
        .unwrap();

        assert!(package.flag("config"));
        assert!(package.flag("domain"));
        assert!(!package.flag("menu_mobile"));
        assert!(!package.flag("menu_web"));
        assert!(package.flag("wx_replies"));
        assert!(!package.flag("wx_cover"));
        assert!(!package.flag("missing"));
    }

    #[test]
    fn test_package_merge_overrides() {
        let mut attributes = Map::new();
        attributes.insert("title".to_string(), json!("教育"));
        attributes.insert("config".to_string(), json!(true));

        let package = ModulePackage::template().merged(&attributes).unwrap();
        assert_eq!(package.title, "教育");
        assert!(package.flag("config"));
        assert!(!package.flag("domain"));
        assert_eq!(package.meta.get("version"), Some(&json!("1.0")));
    }

    #[test]
    fn test_menu_groups_keep_declared_order() {
        let raw = r#"{
            "课程管理": [{"title": "课程列表", "url": "/edu/lesson", "permission": "lesson"}],
            "会员订阅": [{"title": "订阅套餐", "url": "/edu/subscribe", "permission": "subscribe"}],
            "文章": []
        }"#;
        let menus: MenuGroups = serde_json::from_str(raw).unwrap();

        let groups: Vec<&str> = menus.groups().map(|(name, _)| name).collect();
        assert_eq!(groups, vec!["课程管理", "会员订阅", "文章"]);

        let encoded = serde_json::to_string(&menus).unwrap();
        assert!(encoded.find("课程管理").unwrap() < encoded.find("会员订阅").unwrap());
        assert!(encoded.find("会员订阅").unwrap() < encoded.find("文章").unwrap());
    }

    #[test]
    fn test_menu_groups_accept_empty_list() {
        let menus: MenuGroups = serde_json::from_str("[]").unwrap();
        assert!(menus.is_empty());
        assert!(serde_json::from_str::<MenuGroups>(r#"[{"title": "x"}]"#).is_err());
    }

    #[test]
    fn test_retain_items_keeps_groups() {
        let mut menus = MenuGroups::new();
        menus.push("课程管理", MenuItem::new("课程列表", "/edu/lesson", "lesson"));
        menus.push("课程管理", MenuItem::new("添加课程", "/edu/lesson/create", "lesson_create"));
        menus.push(SYSTEM_MENU_GROUP, MenuItem::new("参数设置", "/config", "config"));

        menus.retain_items(|item| item.permission == "lesson");

        assert_eq!(menus.len(), 2);
        assert_eq!(menus.group("课程管理").unwrap().len(), 1);
        assert!(menus.group(SYSTEM_MENU_GROUP).unwrap().is_empty());
    }
}
