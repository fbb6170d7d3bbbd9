//! End-to-end tests for the transform stage

use super::*;
use crate::error::Location;

fn body(target: &TargetCode) -> &str {
    target
        .as_str()
        .rsplit_once('\n')
        .map(|(code, _)| code)
        .unwrap_or("")
}

#[test]
fn test_default_export_is_lowered() {
    let target = transform("export default 1 + 1", &TransformConfig::default()).unwrap();
    assert_eq!(body(&target), "exports.default = 1 + 1;");
}

#[test]
fn test_named_import_is_lowered() {
    let target = transform(
        "import { Foo } from \"bar\"; export default Foo;",
        &TransformConfig::default(),
    )
    .unwrap();
    assert_eq!(
        body(&target),
        "const _bar = require(\"bar\"); const Foo = _bar.Foo; exports.default = Foo;"
    );
}

#[test]
fn test_output_is_deterministic() {
    let source = "import React from \"react\"\nconst App = ({ name }) => <h1>Hi {name}</h1>\nexport default App";
    let config = TransformConfig::default();
    let first = transform(source, &config).unwrap();
    let second = transform(source, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_jsx_app_under_default_config() {
    let source = "const el = <div className=\"a\">{`x${1}`}</div>\nexport default el";
    let target = transform(source, &TransformConfig::default()).unwrap();
    assert_eq!(
        body(&target),
        "const el = React.createElement(\"div\", { className: \"a\" }, \"x\" + 1);\nexports.default = el;"
    );
}

#[test]
fn test_missing_brace_is_a_syntax_error() {
    let err = transform("function f() {\n  return 1\n", &TransformConfig::default()).unwrap_err();
    let TransformError::Syntax { location, .. } = err else {
        unreachable!("Expected syntax error, got {:?}", err);
    };
    assert!(location.is_some());
}

#[test]
fn test_jsx_requires_react_preset() {
    let config = TransformConfig::new(["es2015"], Vec::<String>::new());
    let err = transform("export default <p />", &config).unwrap_err();
    assert_eq!(
        err,
        TransformError::Syntax {
            message: "Support for the experimental syntax 'jsx' isn't currently enabled"
                .to_string(),
            location: Some(Location::new(1, 16)),
        }
    );
}

#[test]
fn test_syntax_plugin_alone_keeps_jsx() {
    let config = TransformConfig::new(Vec::<String>::new(), ["syntax-jsx"]);
    let target = transform("const a = <p>hi</p>", &config).unwrap();
    assert_eq!(body(&target), "const a = <p>hi</p>;");
}

#[test]
fn test_inline_elements_plugin() {
    let config = TransformConfig::new(["es2015"], ["transform-react-inline-elements"]);
    let target = transform("export default <b>ok</b>", &config).unwrap();
    assert_eq!(
        body(&target),
        "exports.default = { type: \"b\", props: { children: \"ok\" } };"
    );
}

#[test]
fn test_validation_failure() {
    let err = transform("return 5", &TransformConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        TransformError::Validation {
            rule: "return-outside-function",
            ..
        }
    ));
}

#[test]
fn test_config_failure_produces_no_output() {
    let config = TransformConfig::new(["es2015", "es2015"], Vec::<String>::new());
    let err = transform("export default 1", &config).unwrap_err();
    assert!(matches!(err, TransformError::Config(_)));
}

#[test]
fn test_lines_and_map_point_back_to_source() {
    let source = "import { a } from \"m\"\n\n\nexport default a.missing.deep";
    let target = transform(source, &TransformConfig::default()).unwrap();

    // `exports.default = ...` stays on line 4
    let line = target.as_str().lines().nth(3).unwrap();
    assert!(line.starts_with("exports.default = "));

    let map = target.source_map().unwrap();
    assert!(map.matches(source));
    assert_eq!(map.lookup(3, 0), Some(Location::new(4, 1)));
}

#[test]
fn test_empty_source() {
    let target = transform("", &TransformConfig::default()).unwrap();
    assert_eq!(body(&target), "");
    assert!(target.source_map().is_some());
}
