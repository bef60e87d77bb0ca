use std::convert::TryFrom;
use lazy_static::lazy_static;
use modcrafter::catalog::{SourceDescriptor, TemplateEntry};
use modcrafter::render::render;
use modcrafter::tokens::{resolve, Overrides, TokenKey};
use modcrafter::types::TemplateId;
use modcrafter::{plan, ModuleName, Store};
use proptest::prelude::*;

lazy_static! {
    static ref BUILTIN: Store = Store::load(&SourceDescriptor::Builtin).unwrap();
}

fn module_name() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,24}"
}

fn entry(body: &str) -> TemplateEntry {
    TemplateEntry::new(TemplateId::try_from("sample").unwrap(), Default::default(), body, "out.txt").unwrap()
}

proptest! {
    #[test]
    fn resolve_is_deterministic(name in module_name()) {
        let name = ModuleName::try_from(name).unwrap();
        prop_assert_eq!(resolve(&name, &Overrides::new()), resolve(&name, &Overrides::new()));
    }

    #[test]
    fn every_key_has_a_value(name in module_name()) {
        let tokens = resolve(&ModuleName::try_from(name).unwrap(), &Overrides::new());
        for key in TokenKey::ALL {
            prop_assert!(tokens.value(*key).map_or(false, |value| !value.is_empty()));
        }
    }

    #[test]
    fn plan_order_is_stable(name in module_name()) {
        let first = plan::plan(&name, &Overrides::new(), BUILTIN.list_entries(None)).unwrap();
        let second = plan::plan(&name, &Overrides::new(), BUILTIN.list_entries(None).collect::<Vec<_>>().into_iter().rev()).unwrap();
        let destinations = first.destinations().collect::<Vec<_>>();
        prop_assert_eq!(&destinations, &second.destinations().collect::<Vec<_>>());

        let mut sorted = destinations.clone();
        sorted.sort();
        prop_assert_eq!(destinations, sorted);
    }

    #[test]
    fn longest_key_wins(name in module_name()) {
        let tokens = resolve(&ModuleName::try_from(name).unwrap(), &Overrides::new());
        let body = "[MODULE_NAME_TO_LOWER]|[MODULE_NAME_TO_UPPER]|[MODULE_NAME]";
        let rendered = render(&entry(body), &tokens).unwrap();
        let expected = format!(
            "{}|{}|{}",
            tokens.value(TokenKey::ModuleNameToLower).unwrap(),
            tokens.value(TokenKey::ModuleNameToUpper).unwrap(),
            tokens.value(TokenKey::ModuleName).unwrap(),
        );
        prop_assert_eq!(rendered.content, expected);
    }

    #[test]
    fn no_placeholder_remains(name in module_name()) {
        let plan = plan::plan(&name, &Overrides::new(), BUILTIN.list_entries(None)).unwrap();
        prop_assert_eq!(plan.len(), 3);
        for write in plan.writes() {
            prop_assert!(!write.content.contains("[MODULE_"));
            prop_assert!(!write.destination.to_string_lossy().contains("[MODULE_"));
        }
    }

    #[test]
    fn values_are_not_rescanned(description in "[ -~]{0,40}") {
        let name = ModuleName::try_from("billing").unwrap();
        let overrides = Overrides::new().with_description(format!("[MODULE_NAME]{}", description));
        let tokens = resolve(&name, &overrides);
        let rendered = render(&entry("<[MODULE_DESCRIPTION]>"), &tokens).unwrap();
        prop_assert_eq!(rendered.content, format!("<[MODULE_NAME]{}>", description));
    }
}
