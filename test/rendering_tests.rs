use shallow_render::mocks::provider::MOCK_OF_KEY;
use shallow_render::{
    scheduler_token, ComponentDef, DirectiveDef, Func, InjectionToken, ModuleDef, Obj, PipeDef,
    Provide, ProviderEntry, RenderOptions, ServiceDef, Shallow, ShallowError, Token, TypeRef,
    Value,
};

#[cfg(test)]
mod tests {
    use super::*;

    struct App {
        child: TypeRef,
        pipe: TypeRef,
        structural: TypeRef,
        service: TypeRef,
        parent: TypeRef,
        module: TypeRef,
    }

    // A small application: a parent component whose template uses a child
    // component, a pipe, a structural directive and a provided service.
    fn build_app() -> App {
        let child = ComponentDef::new("ChildComponent")
            .selector("child")
            .input("value", None)
            .output("clicked", None)
            .template("<span>real child</span>")
            .define();
        let pipe = PipeDef::new("LabelPipe", "label")
            .transform(|args| match args.first() {
                Some(Value::Str(s)) => Value::str(s.to_uppercase()),
                _ => Value::Undefined,
            })
            .define();
        let structural = DirectiveDef::new("IfThingDirective")
            .selector("[ifThing]")
            .structural()
            .input("ifThing", None)
            .define();
        let service = ServiceDef::new("GreetingService")
            .construct(|_| {
                let obj = Obj::new();
                obj.set("greet", Value::Func(Func::new(|_| Value::str("real"))));
                Value::Obj(obj)
            })
            .define();
        let parent = ComponentDef::new("ParentComponent")
            .selector("parent")
            .input("title", Some("header"))
            .output("saved", None)
            .template(
                "<h1>{{ title | label }}</h1>\
                 <child [value]=\"title\" (clicked)=\"onClick($event)\"></child>\
                 <div *ifThing=\"flag\">hidden text</div>\
                 <p class=\"row\">a</p><p class=\"row\">b</p>",
            )
            .construct(|_, instance| {
                instance.set("title", Value::str(""));
                instance.set("flag", Value::Bool(true));
                instance.set("onClick", Value::Func(Func::recorded(|_| Value::Undefined)));
            })
            .define();
        let module = ModuleDef::new("AppModule")
            .declaration(&child)
            .declaration(&pipe)
            .declaration(&structural)
            .declaration(&parent)
            .provider(ProviderEntry::from(&service))
            .define();
        App {
            child,
            pipe,
            structural,
            service,
            parent,
            module,
        }
    }

    #[test]
    fn should_expose_the_unit_instance_and_element() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();
        assert_eq!(rendering.element.tag(), "parent");
        assert_eq!(rendering.instance.get("title"), Some(Value::str("")));
    }

    #[test]
    fn should_replace_collaborators_with_mocks() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();

        let found = rendering.find("child").unwrap();
        let element = found.assert_found_one();
        let mock_type = element.component_type().unwrap();
        assert_eq!(*mock_type.mock_of().unwrap(), app.child);
        // The mock renders nothing in place of the real child template.
        assert_eq!(element.text(), "");
    }

    #[test]
    fn should_find_by_original_reference() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();
        let found = rendering.find(&app.child).unwrap();
        let element = found.assert_found_one();
        let mock_type = element.component_type().unwrap();
        assert_eq!(*mock_type.mock_of().unwrap(), app.child);
    }

    #[test]
    fn should_apply_bindings_through_input_aliases() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module)
            .render_with(RenderOptions::default().bind("header", Value::str("Hello")))
            .unwrap();

        assert_eq!(rendering.instance.get("title"), Some(Value::str("Hello")));
        // The bound value flows onward into the mocked child's input.
        let child = rendering.find_component(&app.child).unwrap();
        assert_eq!(child.prop("value").unwrap(), Value::str("Hello"));
    }

    #[test]
    fn should_find_a_mocked_component_that_is_also_provided() {
        let app = build_app();
        let module = ModuleDef::new("ProvidingModule")
            .declaration(&app.child)
            .declaration(&app.pipe)
            .declaration(&app.structural)
            .declaration(&app.parent)
            .provider(ProviderEntry::from(&app.service))
            .provider(ProviderEntry::from(&app.child))
            .define();
        let rendering = Shallow::new(&app.parent, &module).render().unwrap();

        // The class-provider stub for the child must not displace its
        // component mock, or the rendered child is unreachable by reference.
        let found = rendering.find(&app.child).unwrap();
        let element = found.assert_found_one();
        assert_eq!(
            *element.component_type().unwrap().mock_of().unwrap(),
            app.child
        );
    }

    #[test]
    fn should_apply_directive_binds_on_the_next_detection_pass() {
        let directive = DirectiveDef::new("ThingDirective")
            .selector("[thing]")
            .input("thing", None)
            .define();
        let rendering = Shallow::standalone(&directive)
            .render_with(
                RenderOptions::default()
                    .bind("thing", Value::str("v"))
                    .detect_changes(false),
            )
            .unwrap();

        assert_eq!(rendering.instance.get("thing"), None);
        rendering.fixture.detect_changes().unwrap();
        assert_eq!(rendering.instance.get("thing"), Some(Value::str("v")));
    }

    #[test]
    fn should_reject_unknown_bind_targets() {
        let app = build_app();
        let result = Shallow::new(&app.parent, &app.module)
            .render_with(RenderOptions::default().bind("nope", Value::num(1.0)));
        match result {
            Err(ShallowError::NotAnInput { property, .. }) => assert_eq!(property, "nope"),
            other => panic!("expected NotAnInput, got {:?}", other.err()),
        }
    }

    #[test]
    fn should_reject_bindings_on_entry_components() {
        let app = build_app();
        let module = ModuleDef::new("EntryModule")
            .declaration(&app.child)
            .declaration(&app.pipe)
            .declaration(&app.structural)
            .declaration(&app.parent)
            .entry_component(&app.parent)
            .define();
        let result = Shallow::new(&app.parent, &module)
            .render_with(RenderOptions::default().bind("header", Value::str("x")));
        assert!(matches!(
            result,
            Err(ShallowError::InvalidBindOnEntryComponent { .. })
        ));
    }

    #[test]
    fn should_leave_the_instance_unbound_without_change_detection() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module)
            .render_with(
                RenderOptions::default()
                    .bind("header", Value::str("Hello"))
                    .detect_changes(false),
            )
            .unwrap();
        assert_eq!(rendering.instance.get("title"), Some(Value::str("")));
    }

    #[test]
    fn should_wire_template_listeners_to_mock_outputs() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();

        let child = rendering.find_component(&app.child).unwrap();
        let emitter = match child.prop("clicked").unwrap() {
            Value::Emitter(e) => e,
            other => panic!("expected emitter, got {other:?}"),
        };
        emitter.emit(Value::str("evt"));

        let on_click = rendering.instance.get("onClick").unwrap();
        let func = on_click.as_func().unwrap();
        assert_eq!(func.call_count(), 1);
        assert_eq!(func.calls()[0], vec![Value::str("evt")]);
    }

    #[test]
    fn should_expose_declared_output_emitters() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();
        let emitter = rendering.outputs("saved").unwrap();
        emitter.emit(Value::num(1.0));
        assert_eq!(emitter.emissions(), vec![Value::num(1.0)]);
    }

    #[test]
    fn should_reject_unknown_outputs() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();
        assert!(matches!(
            rendering.outputs("bogus"),
            Err(ShallowError::NotAnOutput { .. })
        ));
    }

    #[test]
    fn should_reject_outputs_that_hold_no_emitter() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();
        rendering.instance.set("saved", Value::str("not an emitter"));
        assert!(matches!(
            rendering.outputs("saved"),
            Err(ShallowError::NotAnEmitter { .. })
        ));
    }

    #[test]
    fn should_keep_structural_content_dark_by_default() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();
        assert!(rendering.find("div").unwrap().is_empty());
        // The directive instance itself is still reachable.
        rendering
            .find_directive(&app.structural)
            .unwrap()
            .assert_found_one();
    }

    #[test]
    fn should_materialize_content_on_render_contents() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();

        let directive = rendering.find_directive(&app.structural).unwrap();
        directive.call("render_contents", &[]).unwrap();

        let div = rendering.find("div").unwrap();
        assert_eq!(div.text().unwrap(), "hidden text");

        directive.call("clear_contents", &[]).unwrap();
        assert!(rendering.find("div").unwrap().is_empty());
    }

    #[test]
    fn should_auto_render_structural_content_when_configured() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module)
            .with_structural_directive(&app.structural, true)
            .render()
            .unwrap();
        assert_eq!(rendering.find("div").unwrap().text().unwrap(), "hidden text");
    }

    #[test]
    fn should_render_real_structural_directives_when_exempted() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module)
            .dont_mock(&app.structural)
            .render()
            .unwrap();
        assert_eq!(rendering.find("div").unwrap().text().unwrap(), "hidden text");
    }

    #[test]
    fn should_stub_pipes_to_undefined() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module)
            .render_with(RenderOptions::default().bind("header", Value::str("hello")))
            .unwrap();
        assert_eq!(rendering.find("h1").unwrap().text().unwrap(), "");
    }

    #[test]
    fn should_apply_custom_pipe_transforms() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module)
            .mock_pipe(&app.pipe, |_| Value::str("piped"))
            .render()
            .unwrap();
        assert_eq!(rendering.find("h1").unwrap().text().unwrap(), "piped");
    }

    #[test]
    fn should_run_real_pipes_when_exempted() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module)
            .dont_mock(&app.pipe)
            .render_with(RenderOptions::default().bind("header", Value::str("hello")))
            .unwrap();
        assert_eq!(rendering.find("h1").unwrap().text().unwrap(), "HELLO");
    }

    #[test]
    fn should_mock_module_providers() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();
        let resolved = rendering.get(&app.service).unwrap();
        let stub = resolved.as_obj().unwrap();
        assert_eq!(stub.get(MOCK_OF_KEY), Some(Value::Type(app.service.clone())));
    }

    #[test]
    fn should_record_stubbed_service_calls() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module)
            .mock(
                &app.service,
                shallow_render::Stubs::new().with_returning("greet", Value::str("stub")),
            )
            .render()
            .unwrap();

        let resolved = rendering.get(&app.service).unwrap();
        let stub = resolved.as_obj().unwrap();
        assert_eq!(stub.call("greet", &[]), Some(Value::str("stub")));
        let greet = stub.get("greet").unwrap();
        assert_eq!(greet.as_func().unwrap().call_count(), 1);
    }

    #[test]
    fn should_use_real_services_when_exempted() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module)
            .dont_mock(&app.service)
            .render()
            .unwrap();
        let resolved = rendering.get(&app.service).unwrap();
        let real = resolved.as_obj().unwrap();
        assert_eq!(real.call("greet", &[]), Some(Value::str("real")));
    }

    #[test]
    fn should_fail_for_unprovided_tokens() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();
        let token = InjectionToken::new("UNKNOWN");
        assert!(matches!(
            rendering.get(&token),
            Err(ShallowError::NoProvider { .. })
        ));
    }

    #[test]
    fn should_create_services_without_rendering() {
        let app = build_app();
        let service = Shallow::new(&app.service, &app.module)
            .create_service()
            .unwrap();
        let obj = service.as_obj().unwrap();
        assert_eq!(obj.call("greet", &[]), Some(Value::str("real")));
    }

    #[test]
    fn should_patch_static_functions_in_place() {
        let app = build_app();
        let versioned = ServiceDef::new("VersionedService")
            .static_member("version", Value::Func(Func::new(|_| Value::str("real"))))
            .define();
        Shallow::new(&app.parent, &app.module)
            .mock_static(
                &versioned,
                shallow_render::Stubs::new().with_returning("version", Value::str("stubbed")),
            )
            .render()
            .unwrap();

        let patched = versioned.statics().borrow().get("version").cloned().unwrap();
        let func = patched.as_func().unwrap();
        assert!(func.is_recorded());
        assert_eq!(func.call(&[]), Value::str("stubbed"));
    }

    #[test]
    fn should_reject_non_function_static_stubs() {
        let app = build_app();
        let versioned = ServiceDef::new("VersionedService")
            .static_member("version", Value::Func(Func::new(|_| Value::str("real"))))
            .define();
        let result = Shallow::new(&app.parent, &app.module)
            .mock_static(
                &versioned,
                shallow_render::Stubs::new().with_value("version", Value::str("nope")),
            )
            .render();
        assert!(matches!(
            result,
            Err(ShallowError::StaticMockNotAFunction { .. })
        ));
    }

    #[test]
    fn should_reject_static_stubs_for_missing_members() {
        let app = build_app();
        let versioned = ServiceDef::new("VersionedService").define();
        let result = Shallow::new(&app.parent, &app.module)
            .mock_static(
                &versioned,
                shallow_render::Stubs::new().with_returning("version", Value::str("x")),
            )
            .render();
        assert!(matches!(
            result,
            Err(ShallowError::StaticMockNotAFunction { .. })
        ));
    }

    #[test]
    fn should_refuse_queries_for_the_test_component() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();
        assert!(matches!(
            rendering.find("parent"),
            Err(ShallowError::MatchedTestComponent { .. })
        ));
        assert!(matches!(
            rendering.find_component(&app.parent),
            Err(ShallowError::MatchedTestComponent { .. })
        ));
    }

    #[test]
    fn should_report_every_match_for_broad_queries() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module).render().unwrap();
        let rows = rendering.find(".row").unwrap();
        rows.assert_found(2);
        assert!(matches!(
            rows.one(),
            Err(ShallowError::MultipleMatches { count: 2, .. })
        ));
    }

    #[test]
    fn should_render_custom_templates() {
        let app = build_app();
        let rendering = Shallow::new(&app.parent, &app.module)
            .render_template("<parent [header]=\"'Hi'\"></parent>")
            .unwrap();
        assert_eq!(rendering.instance.get("title"), Some(Value::str("Hi")));
        // The unit renders for real inside the wrapper.
        assert_eq!(rendering.find("h1").unwrap().text().unwrap(), "");
    }

    #[test]
    fn should_declare_extra_units_for_custom_templates() {
        let app = build_app();
        let badge = ComponentDef::new("BadgeComponent")
            .selector("badge")
            .template("badge!")
            .define();
        let rendering = Shallow::new(&app.parent, &app.module)
            .declare(&badge)
            .render_template("<parent></parent><badge id=\"b1\"></badge>")
            .unwrap();

        let found = rendering.find("badge").unwrap();
        let element = found.assert_found_one();
        // Declared units render for real; they are not mocked.
        assert_eq!(element.text(), "badge!");
        assert_eq!(element.attr("id"), Some("b1".to_string()));
    }

    #[test]
    fn should_mock_providers_registered_through_provide_mock() {
        let app = build_app();
        let audit = ServiceDef::new("AuditService").define();
        let rendering = Shallow::new(&app.parent, &app.module)
            .provide_mock(Provide::Class(audit.clone()))
            .mock(
                &audit,
                shallow_render::Stubs::new().with_value(
                    "record",
                    Value::Func(Func::recorded_returning(Value::str("ok"))),
                ),
            )
            .render()
            .unwrap();

        let resolved = rendering.get(&audit).unwrap();
        let stub = resolved.as_obj().unwrap();
        assert_eq!(stub.get(MOCK_OF_KEY), Some(Value::Type(audit.clone())));
        assert_eq!(
            stub.call("record", &[Value::str("evt")]),
            Some(Value::str("ok"))
        );
        let record = stub.get("record").unwrap();
        assert_eq!(
            record.as_func().unwrap().calls(),
            vec![vec![Value::str("evt")]]
        );
    }

    #[test]
    fn should_fail_when_the_unit_is_missing_from_the_template() {
        let app = build_app();
        let result = Shallow::new(&app.parent, &app.module).render_template("<div></div>");
        assert!(matches!(result, Err(ShallowError::NoMatches { .. })));
    }

    // A unit whose rendered output comes straight from an injected service.
    fn color_app() -> (TypeRef, TypeRef, TypeRef) {
        let service = ServiceDef::new("ColorService")
            .construct(|_| {
                let obj = Obj::new();
                obj.set("color", Value::Func(Func::new(|_| Value::str("RED"))));
                Value::Obj(obj)
            })
            .define();
        let injected = service.clone();
        let label = ComponentDef::new("ColorLabelComponent")
            .selector("color-label")
            .template("{{service.color()}}")
            .construct(move |injector, instance| {
                if let Ok(resolved) = injector.get_type(&injected) {
                    instance.set("service", resolved);
                }
            })
            .define();
        let module = ModuleDef::new("ColorModule")
            .declaration(&label)
            .provider(ProviderEntry::from(&service))
            .define();
        (service, label, module)
    }

    #[test]
    fn should_render_stubbed_service_output() {
        let (service, label, module) = color_app();
        let rendering = Shallow::new(&label, &module)
            .mock(
                &service,
                shallow_render::Stubs::new().with_returning("color", Value::str("MOCKED COLOR")),
            )
            .render()
            .unwrap();
        assert_eq!(rendering.element.text(), "MOCKED COLOR");
    }

    #[test]
    fn should_render_real_service_output_when_exempted() {
        let (service, label, module) = color_app();
        let rendering = Shallow::new(&label, &module)
            .dont_mock(&service)
            .render()
            .unwrap();
        assert_eq!(rendering.element.text(), "RED");
    }

    fn loader_component() -> TypeRef {
        ComponentDef::new("LoaderComponent")
            .selector("loader")
            .template("<span>loading</span>")
            .construct(|injector, instance| {
                let target = instance.clone();
                if let Ok(Value::Obj(scheduler)) = injector.get(&Token::from(&scheduler_token()))
                {
                    scheduler.call(
                        "schedule",
                        &[Value::Func(Func::new(move |_| {
                            target.set("loaded", Value::Bool(true));
                            Value::Undefined
                        }))],
                    );
                }
            })
            .define()
    }

    #[test]
    fn should_run_scheduled_tasks_when_awaiting_stability() {
        let loader = loader_component();
        let rendering = Shallow::standalone(&loader).render().unwrap();
        assert_eq!(rendering.instance.get("loaded"), Some(Value::Bool(true)));
    }

    #[test]
    fn should_skip_scheduled_tasks_when_stability_is_not_awaited() {
        let loader = loader_component();
        let rendering = Shallow::standalone(&loader)
            .render_with(RenderOptions::default().when_stable(false))
            .unwrap();
        assert_eq!(rendering.instance.get("loaded"), None);
    }
}
