// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Re-exports of the `tracing` macros, replaced by no-ops when the `tracing`
//! feature is disabled.

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing"))]
mod noop {
    #[allow(unused_macros)]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }
    #[allow(unused_macros)]
    macro_rules! error {
        ($($arg:tt)*) => {};
    }
    #[allow(unused_macros)]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }
    #[allow(unused_macros)]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }
    #[allow(unused_macros)]
    macro_rules! warn_noop {
        ($($arg:tt)*) => {};
    }

    #[allow(unused_imports)]
    pub(crate) use debug;
    #[allow(unused_imports)]
    pub(crate) use error;
    #[allow(unused_imports)]
    pub(crate) use info;
    #[allow(unused_imports)]
    pub(crate) use trace;
    #[allow(unused_imports)]
    pub(crate) use warn_noop as warn;
}

#[cfg(not(feature = "tracing"))]
#[allow(unused_imports)]
pub(crate) use noop::*;
