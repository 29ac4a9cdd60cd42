/// Creates a [`ParameterDescriptor`](crate::ParameterDescriptor) from a name, a type
/// shorthand, an optional `required` flag and an optional description.
///
/// ```rust
/// use palaver::{ParameterType, pv_param};
///
/// let query = pv_param!(query: string required "Text to search for");
/// assert_eq!(query.name, "query");
/// assert_eq!(query.kind, ParameterType::String);
/// assert!(query.required);
///
/// let limit = pv_param!(limit: number);
/// assert!(!limit.required);
/// assert!(limit.description.is_none());
/// ```
#[macro_export]
macro_rules! pv_param {
    (@kind string) => {
        $crate::ParameterType::String
    };
    (@kind number) => {
        $crate::ParameterType::Number
    };
    (@kind $other:ident) => {
        compile_error!("unsupported parameter type: use string or number")
    };
    (@base $name:ident $kind:ident) => {
        $crate::ParameterDescriptor::new(stringify!($name), $crate::pv_param!(@kind $kind))
    };
    (@base $name:ident $kind:ident $description:literal) => {
        $crate::pv_param!(@base $name $kind).with_description($description)
    };
    ($name:ident : $kind:ident required $($description:literal)?) => {
        $crate::pv_param!(@base $name $kind $($description)?).required()
    };
    ($name:ident : $kind:ident $($description:literal)?) => {
        $crate::pv_param!(@base $name $kind $($description)?)
    };
}

/// Creates a [`FunctionDescriptor`](crate::FunctionDescriptor) with its parameters.
///
/// ```rust
/// use palaver::pv_function;
///
/// let search = pv_function!("searchDocs", "Search project documentation", {
///     query: string required "Text to search for",
///     limit: number "Maximum number of results",
/// });
///
/// let definition = search.to_definition();
/// assert_eq!(definition.name, "searchDocs");
/// assert_eq!(definition.parameters["required"][0], "query");
/// assert_eq!(definition.parameters["properties"]["limit"]["type"], "number");
/// ```
#[macro_export]
macro_rules! pv_function {
    ($name:expr, $description:expr $(,)?) => {
        $crate::FunctionDescriptor::new($name).with_description($description)
    };
    ($name:expr, $description:expr, {
        $($param:ident : $kind:ident $($flag:ident)? $($param_description:literal)?),* $(,)?
    } $(,)?) => {{
        let descriptor = $crate::FunctionDescriptor::new($name).with_description($description);
        $(
            let descriptor = descriptor.with_parameter(
                $crate::pv_param!($param : $kind $($flag)? $($param_description)?)
            );
        )*
        descriptor
    }};
}
