//! Action metadata and argument binding.
//!
//! An action declares the parameters its work function expects. Binding maps
//! a call's positional and keyword [`Args`] onto those names the way a
//! function signature would, so both local callers and remote peers get the
//! same [`BindingError`]s.

use serde::{Deserialize, Serialize};

use crate::error::BindingError;
use crate::id::ActionId;
use crate::value::{Args, Map, Value};

/// One declared parameter of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    /// Value used when the caller omits the argument. `None` means required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    #[must_use]
    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Where an action's work actually runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Local,
    Remote,
}

/// Everything a dashboard or a remote peer needs to present and call an
/// action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub id: ActionId,
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    pub interruptible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub origin: Origin,
}

/// Bind `args` onto `params`.
///
/// An empty `params` list means the action did not declare a signature; the
/// arguments are then accepted as-is and the returned map only holds the
/// keyword arguments.
///
/// # Errors
///
/// Returns [`BindingError`] when there are more positionals than parameters,
/// a keyword names no parameter, an argument is given twice, or a required
/// parameter is missing.
pub fn bind(params: &[ParamSpec], args: &Args) -> Result<Map<String, Value>, BindingError> {
    if params.is_empty() {
        return Ok(args.keyword.clone());
    }
    if args.positional.len() > params.len() {
        return Err(BindingError::TooManyPositional {
            expected: params.len(),
            given: args.positional.len(),
        });
    }

    let mut bound = Map::new();
    for (param, value) in params.iter().zip(&args.positional) {
        bound.insert(param.name.clone(), value.clone());
    }
    for (name, value) in &args.keyword {
        if !params.iter().any(|p| &p.name == name) {
            return Err(BindingError::UnknownKeyword(name.clone()));
        }
        if bound.contains_key(name) {
            return Err(BindingError::Duplicate(name.clone()));
        }
        bound.insert(name.clone(), value.clone());
    }
    for param in params {
        if bound.contains_key(&param.name) {
            continue;
        }
        match &param.default {
            Some(default) => {
                bound.insert(param.name.clone(), default.clone());
            }
            None => return Err(BindingError::Missing(param.name.clone())),
        }
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blink_params() -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("times"),
            ParamSpec::optional("delay", 0.5),
        ]
    }

    #[test]
    fn should_bind_positionals_in_declaration_order() {
        let bound = bind(&blink_params(), &Args::positional([json!(3), json!(1.0)])).unwrap();
        assert_eq!(bound["times"], json!(3));
        assert_eq!(bound["delay"], json!(1.0));
    }

    #[test]
    fn should_fill_defaults_for_omitted_parameters() {
        let bound = bind(&blink_params(), &Args::new().kwarg("times", 2)).unwrap();
        assert_eq!(bound["times"], json!(2));
        assert_eq!(bound["delay"], json!(0.5));
    }

    #[test]
    fn should_reject_missing_required_parameter() {
        let err = bind(&blink_params(), &Args::new()).unwrap_err();
        assert_eq!(err, BindingError::Missing("times".to_string()));
    }

    #[test]
    fn should_reject_too_many_positionals() {
        let args = Args::positional([json!(1), json!(2), json!(3)]);
        let err = bind(&blink_params(), &args).unwrap_err();
        assert_eq!(
            err,
            BindingError::TooManyPositional {
                expected: 2,
                given: 3
            }
        );
    }

    #[test]
    fn should_reject_unknown_keyword() {
        let args = Args::new().arg(1).kwarg("colour", "red");
        let err = bind(&blink_params(), &args).unwrap_err();
        assert_eq!(err, BindingError::UnknownKeyword("colour".to_string()));
    }

    #[test]
    fn should_reject_argument_given_twice() {
        let args = Args::new().arg(1).kwarg("times", 2);
        let err = bind(&blink_params(), &args).unwrap_err();
        assert_eq!(err, BindingError::Duplicate("times".to_string()));
    }

    #[test]
    fn should_accept_anything_when_no_parameters_declared() {
        let args = Args::new().arg(1).arg(2).kwarg("x", true);
        let bound = bind(&[], &args).unwrap();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound["x"], json!(true));
    }

    #[test]
    fn should_serialize_action_info_for_dashboards() {
        let info = ActionInfo {
            id: "led.blink".parse().unwrap(),
            name: "Blink".to_string(),
            params: blink_params(),
            interruptible: true,
            timeout_ms: None,
            origin: Origin::Local,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["id"], "led.blink");
        assert_eq!(json["params"][0], json!({"name": "times"}));
        assert_eq!(json["origin"], "local");
        assert!(json.get("timeout_ms").is_none());
    }
}
