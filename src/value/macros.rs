//! Macros for ergonomic value construction.

/// Build a [`Value::Record`](crate::value::Value) from `key => value` pairs.
///
/// Values go through `Value::from`, so plain literals work.
///
/// # Example
///
/// ```rust
/// use accrete::record;
/// use accrete::value::Value;
///
/// let counter = record! {
///     "count" => 100.0,
///     "active" => true,
/// };
///
/// assert_eq!(counter.get("count"), Some(&Value::from(100.0)));
/// assert_eq!(record! {}, Value::Record(Default::default()));
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::value::Value::Record($crate::value::Map::new())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::Map::new();
        $(
            map.insert(($key).to_string(), $crate::value::Value::from($value));
        )+
        $crate::value::Value::Record(map)
    }};
}

/// Build a [`Value::Seq`](crate::value::Value) from elements.
///
/// # Example
///
/// ```rust
/// use accrete::seq;
/// use accrete::value::Value;
///
/// assert_eq!(seq![1.0, 2.0], Value::Seq(vec![Value::from(1.0), Value::from(2.0)]));
/// ```
#[macro_export]
macro_rules! seq {
    () => {
        $crate::value::Value::Seq(Vec::new())
    };
    ($($item:expr),+ $(,)?) => {
        $crate::value::Value::Seq(vec![$($crate::value::Value::from($item)),+])
    };
}
