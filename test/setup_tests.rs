use shallow_render::cache::Identity;
use shallow_render::setup::TestSetup;
use shallow_render::{
    ComponentDef, ModuleDef, Provide, ProviderEntry, ServiceDef, Shallow, Stubs, Value,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_merge_stub_maps_key_by_key() {
        let mut base = Stubs::new()
            .with_value("kept", Value::str("base"))
            .with_value("overridden", Value::str("base"));
        let later = Stubs::new().with_value("overridden", Value::str("later"));

        base.merge(&later);
        assert_eq!(base.get("kept"), Some(&Value::str("base")));
        assert_eq!(base.get("overridden"), Some(&Value::str("later")));
    }

    #[test]
    fn should_always_exempt_the_unit_under_test() {
        let unit = ComponentDef::new("UnitComponent").define();
        let setup = TestSetup::new(unit.clone(), None);
        assert!(setup.is_dont_mock(unit.identity()));
    }

    #[test]
    fn should_seed_new_setups_from_the_global_registries() {
        Shallow::reset_globals();
        let unit = ComponentDef::new("UnitComponent").define();
        let real = ServiceDef::new("RealService").define();
        let translate = ModuleDef::new("TranslateModule").define();
        let logger = ServiceDef::new("LoggerService").define();

        Shallow::never_mock(&real);
        Shallow::always_mock(&logger, Stubs::new().with_value("level", Value::str("warn")));
        Shallow::always_provide(ProviderEntry::Provide(Provide::Class(real.clone())));
        Shallow::always_import(&translate);

        let setup = TestSetup::new(unit, None);
        assert!(setup.is_dont_mock(real.identity()));
        assert_eq!(
            setup.stubs_for(logger.identity()).unwrap().get("level"),
            Some(&Value::str("warn"))
        );
        assert_eq!(setup.providers.len(), 1);
        assert_eq!(setup.imports, vec![translate]);

        Shallow::reset_globals();
    }

    #[test]
    fn should_not_let_scenario_merges_mutate_global_stubs() {
        Shallow::reset_globals();
        let logger = ServiceDef::new("LoggerService").define();
        Shallow::always_mock(&logger, Stubs::new().with_value("level", Value::str("global")));

        let unit = ComponentDef::new("UnitComponent").define();
        let mut first = TestSetup::new(unit.clone(), None);
        first.merge_mock(
            logger.identity(),
            Stubs::new().with_value("level", Value::str("scenario")),
        );
        assert_eq!(
            first.stubs_for(logger.identity()).unwrap().get("level"),
            Some(&Value::str("scenario"))
        );

        let second = TestSetup::new(unit, None);
        assert_eq!(
            second.stubs_for(logger.identity()).unwrap().get("level"),
            Some(&Value::str("global"))
        );

        Shallow::reset_globals();
    }

    #[test]
    fn should_merge_repeated_always_mock_registrations() {
        Shallow::reset_globals();
        let logger = ServiceDef::new("LoggerService").define();
        Shallow::always_mock(
            &logger,
            Stubs::new()
                .with_value("level", Value::str("info"))
                .with_value("sink", Value::str("stdout")),
        );
        Shallow::always_mock(&logger, Stubs::new().with_value("level", Value::str("warn")));

        let unit = ComponentDef::new("UnitComponent").define();
        let setup = TestSetup::new(unit, None);
        let stubs = setup.stubs_for(logger.identity()).unwrap();
        assert_eq!(stubs.get("level"), Some(&Value::str("warn")));
        assert_eq!(stubs.get("sink"), Some(&Value::str("stdout")));

        Shallow::reset_globals();
    }

    #[test]
    fn should_clear_every_registration_on_reset() {
        let unit = ComponentDef::new("UnitComponent").define();
        let real = ServiceDef::new("RealService").define();
        let translate = ModuleDef::new("TranslateModule").define();

        Shallow::never_mock(&real);
        Shallow::always_mock(&real, Stubs::new().with_value("x", Value::num(1.0)));
        Shallow::always_provide(ProviderEntry::Provide(Provide::Class(real.clone())));
        Shallow::always_import(&translate);
        Shallow::reset_globals();

        let setup = TestSetup::new(unit.clone(), None);
        assert!(!setup.is_dont_mock(real.identity()));
        assert!(setup.stubs_for(real.identity()).is_none());
        assert!(setup.providers.is_empty());
        assert!(setup.imports.is_empty());
        // The unit under test stays exempt regardless.
        assert!(setup.is_dont_mock(unit.identity()));
    }

    #[test]
    fn should_merge_scenario_mocks_for_the_same_reference() {
        let unit = ComponentDef::new("UnitComponent").define();
        let service = ServiceDef::new("SomeService").define();
        let mut setup = TestSetup::new(unit, None);

        setup.merge_mock(
            service.identity(),
            Stubs::new()
                .with_value("a", Value::num(1.0))
                .with_value("b", Value::num(2.0)),
        );
        setup.merge_mock(service.identity(), Stubs::new().with_value("b", Value::num(3.0)));

        let stubs = setup.stubs_for(service.identity()).unwrap();
        assert_eq!(stubs.get("a"), Some(&Value::num(1.0)));
        assert_eq!(stubs.get("b"), Some(&Value::num(3.0)));
    }
}
