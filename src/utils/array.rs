use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::object::resolve_nested;

/// Custom equality used to match a candidate against an element.
///
/// Two matchers compare equal only when they share the same closure, which is
/// what change detection needs to tell a new `compareWith` from the old one.
#[derive(Clone)]
pub struct ElementMatcher(Rc<dyn Fn(&Value, &Value) -> bool>);

impl ElementMatcher {
    pub fn new(matcher: impl Fn(&Value, &Value) -> bool + 'static) -> Self {
        Self(Rc::new(matcher))
    }

    pub fn matches(&self, element: &Value, target: &Value) -> bool {
        (self.0)(element, target)
    }
}

impl PartialEq for ElementMatcher {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ElementMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ElementMatcher(..)")
    }
}

/// Finds the first element matching `target`.
///
/// With a matcher, `matcher(element, target)` decides. Otherwise the element
/// is resolved through `path` and compared structurally.
pub fn find_element<'a>(
    elements: &'a [Value],
    target: &Value,
    path: Option<&str>,
    matcher: Option<&ElementMatcher>,
) -> Option<&'a Value> {
    elements.iter().find(|element| match matcher {
        Some(matcher) => matcher.matches(element, target),
        None => resolve_nested(element, path) == Some(target),
    })
}

/// Elements of `left` that can be found in `right`.
///
/// A `null` match counts as not found.
pub fn intersection(
    left: &[Value],
    right: &[Value],
    matcher: Option<&ElementMatcher>,
) -> Vec<Value> {
    left.iter()
        .filter(|candidate| {
            find_element(right, candidate, None, matcher).is_some_and(|found| !found.is_null())
        })
        .cloned()
        .collect()
}
