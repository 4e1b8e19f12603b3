// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

macro_rules! assert_almost_eq {
    ($left:expr, $right:expr, $max_error:expr $(,)?) => {
        match (&$left, &$right, &$max_error) {
            (left_val, right_val, max_error) => {
                let diff = if *left_val > *right_val {
                    *left_val - *right_val
                } else {
                    *right_val - *left_val
                };
                match diff.partial_cmp(max_error) {
                    Some(std::cmp::Ordering::Greater) | None => panic!(
                        "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n max_error: `{:?}`",
                        left_val, right_val, max_error
                    ),
                    _ => {}
                }
            }
        }
    };
}
pub(crate) use assert_almost_eq;
