//! The lifecycle of an asynchronous result.

/// The state of one asynchronous operation's outcome.
///
/// A state starts as [`Initial`](DataState::Initial), becomes
/// [`Loading`](DataState::Loading) when the operation starts, and ends as
/// either [`Success`](DataState::Success) or [`Error`](DataState::Error).
/// States are values: moving on means replacing the whole state, never
/// patching it.
///
/// The hooks (`on_*` methods) borrow the state and hand it back, so they
/// can be chained when rendering:
///
/// ```
/// # use gemchat_core::DataState;
/// let state: DataState<u32, String> = DataState::Success(42);
/// let mut shown = None;
/// state
///     .on_loading(|| shown = Some("spinner".to_owned()))
///     .on_success(|v| println!("value: {v}"))
///     .on_error(|e| println!("error: {e}"));
/// assert!(shown.is_none());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DataState<T, E> {
    /// The operation has not started.
    #[default]
    Initial,
    /// The operation is in flight.
    Loading,
    /// The operation produced a value.
    Success(T),
    /// The operation failed.
    Error(E),
}

impl<T, E> DataState<T, E> {
    /// Returns `true` if the operation has not started.
    #[inline]
    pub fn is_initial(&self) -> bool {
        matches!(self, DataState::Initial)
    }

    /// Returns `true` if the operation is in flight.
    #[inline]
    pub fn is_loading(&self) -> bool {
        matches!(self, DataState::Loading)
    }

    /// Returns `true` if the operation produced a value.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, DataState::Success(_))
    }

    /// Returns `true` if the operation failed.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, DataState::Error(_))
    }

    /// Returns `true` if the operation has an outcome, either a value or an
    /// error.
    #[inline]
    pub fn is_finalized(&self) -> bool {
        matches!(self, DataState::Success(_) | DataState::Error(_))
    }

    /// Returns `true` if the operation may be (re)started from here: it is
    /// neither in flight nor already successful.
    #[inline]
    pub fn is_refreshable(&self) -> bool {
        matches!(self, DataState::Initial | DataState::Error(_))
    }

    /// Converts from `&DataState<T, E>` to `DataState<&T, &E>`.
    #[inline]
    pub fn as_ref(&self) -> DataState<&T, &E> {
        match self {
            DataState::Initial => DataState::Initial,
            DataState::Loading => DataState::Loading,
            DataState::Success(data) => DataState::Success(data),
            DataState::Error(err) => DataState::Error(err),
        }
    }

    /// Maps the value of a successful state. Other states pass through,
    /// errors keep their cause.
    #[inline]
    pub fn map<R, F: FnOnce(T) -> R>(self, f: F) -> DataState<R, E> {
        match self {
            DataState::Initial => DataState::Initial,
            DataState::Loading => DataState::Loading,
            DataState::Success(data) => DataState::Success(f(data)),
            DataState::Error(err) => DataState::Error(err),
        }
    }

    /// Maps the cause of a failed state.
    #[inline]
    pub fn map_err<R, F: FnOnce(E) -> R>(self, f: F) -> DataState<T, R> {
        match self {
            DataState::Initial => DataState::Initial,
            DataState::Loading => DataState::Loading,
            DataState::Success(data) => DataState::Success(data),
            DataState::Error(err) => DataState::Error(f(err)),
        }
    }

    /// Calls `f` if the operation has not started.
    #[inline]
    pub fn on_initial<F: FnOnce()>(&self, f: F) -> &Self {
        if self.is_initial() {
            f();
        }
        self
    }

    /// Calls `f` if the operation is in flight.
    #[inline]
    pub fn on_loading<F: FnOnce()>(&self, f: F) -> &Self {
        if self.is_loading() {
            f();
        }
        self
    }

    /// Calls `f` with the value if the operation succeeded.
    #[inline]
    pub fn on_success<F: FnOnce(&T)>(&self, f: F) -> &Self {
        if let DataState::Success(data) = self {
            f(data);
        }
        self
    }

    /// Calls `f` with the cause if the operation failed.
    #[inline]
    pub fn on_error<F: FnOnce(&E)>(&self, f: F) -> &Self {
        if let DataState::Error(err) = self {
            f(err);
        }
        self
    }

    /// Calls `f` if the operation has an outcome.
    #[inline]
    pub fn on_finalized<F: FnOnce()>(&self, f: F) -> &Self {
        if self.is_finalized() {
            f();
        }
        self
    }

    /// Calls `f` if the operation may be (re)started.
    #[inline]
    pub fn on_refreshable<F: FnOnce()>(&self, f: F) -> &Self {
        if self.is_refreshable() {
            f();
        }
        self
    }

    /// Returns the value if the operation succeeded.
    #[inline]
    pub fn data(&self) -> Option<&T> {
        match self {
            DataState::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Converts into the value if the operation succeeded.
    #[inline]
    pub fn into_data(self) -> Option<T> {
        match self {
            DataState::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the cause if the operation failed.
    #[inline]
    pub fn error(&self) -> Option<&E> {
        match self {
            DataState::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the value, or `default` for any other state.
    #[inline]
    pub fn data_or(self, default: T) -> T {
        self.into_data().unwrap_or(default)
    }

    /// Returns the value, or computes one for any other state.
    #[inline]
    pub fn data_or_else<F: FnOnce() -> T>(self, f: F) -> T {
        self.into_data().unwrap_or_else(f)
    }

    /// Returns the value, or `T::default()` for any other state.
    #[inline]
    pub fn data_or_default(self) -> T
    where
        T: Default,
    {
        self.into_data().unwrap_or_default()
    }

    /// Converts a finalized state into a `Result`, or `None` if there is no
    /// outcome yet.
    #[inline]
    pub fn into_result(self) -> Option<Result<T, E>> {
        match self {
            DataState::Success(data) => Some(Ok(data)),
            DataState::Error(err) => Some(Err(err)),
            DataState::Initial | DataState::Loading => None,
        }
    }

    /// Merges two states.
    ///
    /// The result is successful only if both are, with the value computed
    /// by `f`. Otherwise the first error wins, then loading, then initial.
    pub fn combine<U, R, F>(
        self,
        other: DataState<U, E>,
        f: F,
    ) -> DataState<R, E>
    where
        F: FnOnce(T, U) -> R,
    {
        use DataState::*;

        match (self, other) {
            (Success(a), Success(b)) => Success(f(a, b)),
            (Error(err), _) | (_, Error(err)) => Error(err),
            (Loading, _) | (_, Loading) => Loading,
            _ => Initial,
        }
    }

    /// Merges three states, with the same priorities as
    /// [`combine`](Self::combine).
    pub fn combine3<U, V, R, F>(
        self,
        other: DataState<U, E>,
        other2: DataState<V, E>,
        f: F,
    ) -> DataState<R, E>
    where
        F: FnOnce(T, U, V) -> R,
    {
        use DataState::*;

        match (self, other, other2) {
            (Success(a), Success(b), Success(c)) => Success(f(a, b, c)),
            (Error(err), _, _) | (_, Error(err), _) | (_, _, Error(err)) => {
                Error(err)
            }
            (Loading, _, _) | (_, Loading, _) | (_, _, Loading) => Loading,
            _ => Initial,
        }
    }

    /// Merges two states into a pair.
    #[inline]
    pub fn zip<U>(self, other: DataState<U, E>) -> DataState<(T, U), E> {
        self.combine(other, |a, b| (a, b))
    }
}

impl<T, E> DataState<Vec<T>, E> {
    /// Calls `f` if the operation succeeded with a non-empty list.
    #[inline]
    pub fn on_data<F: FnOnce(&[T])>(&self, f: F) -> &Self {
        if let DataState::Success(data) = self {
            if !data.is_empty() {
                f(data);
            }
        }
        self
    }

    /// Calls `f` if the operation succeeded with an empty list.
    #[inline]
    pub fn on_empty<F: FnOnce()>(&self, f: F) -> &Self {
        if let DataState::Success(data) = self {
            if data.is_empty() {
                f();
            }
        }
        self
    }

    /// Returns `true` if the operation succeeded with a non-empty list.
    #[inline]
    pub fn has_data(&self) -> bool {
        self.data().is_some_and(|data| !data.is_empty())
    }

    /// Returns the list, or an empty one for any other state.
    #[inline]
    pub fn data_or_empty(self) -> Vec<T> {
        self.data_or_default()
    }

    /// Maps every element of a successful list.
    #[inline]
    pub fn map_each<R, F: FnMut(T) -> R>(self, f: F) -> DataState<Vec<R>, E> {
        self.map(|data| data.into_iter().map(f).collect())
    }
}

impl<T, E> From<Result<T, E>> for DataState<T, E> {
    #[inline]
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => DataState::Success(data),
            Err(err) => DataState::Error(err),
        }
    }
}

/// Yields the values of successful states, skipping all others.
pub fn success_values<T, E, I>(states: I) -> impl Iterator<Item = T>
where
    I: IntoIterator<Item = DataState<T, E>>,
{
    states.into_iter().filter_map(DataState::into_data)
}
