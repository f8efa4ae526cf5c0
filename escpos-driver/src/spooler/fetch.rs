//! Two-phase "ask for the size, then fetch" calls
//!
//! Win32 enumeration APIs fill caller-allocated buffers: the first call with
//! no buffer reports the required size, the second fills it.

use crate::error::PrintResult;

/// Output of [`query_then_fetch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<T> {
    /// Buffer sized to what the first call asked for
    pub buf: Vec<T>,
    /// Item count reported by the second call
    pub count: u32,
}

impl<T> Fetched<T> {
    fn empty() -> Self {
        Self {
            buf: Vec::new(),
            count: 0,
        }
    }
}

/// Run a size-query call followed by a fetch call
///
/// `call(buffer, needed, returned)` is invoked once with `None` to learn the
/// size in units of `T`. The closure must report the OS "insufficient
/// buffer" answer to that query as `Ok`; any error it returns is passed
/// through, whatever `needed` says. A zero size means there is nothing to
/// fetch. Otherwise a buffer of that size is allocated and `call` runs
/// again; a failure of the second call is returned as is.
pub fn query_then_fetch<T, F>(mut call: F) -> PrintResult<Fetched<T>>
where
    T: Copy + Default,
    F: FnMut(Option<&mut [T]>, &mut u32, &mut u32) -> PrintResult<()>,
{
    let mut needed: u32 = 0;
    let mut returned: u32 = 0;

    call(None, &mut needed, &mut returned)?;

    if needed == 0 {
        return Ok(Fetched::empty());
    }

    let mut buf = vec![T::default(); needed as usize];
    call(Some(buf.as_mut_slice()), &mut needed, &mut returned)?;

    Ok(Fetched {
        buf,
        count: returned,
    })
}
