//! Input contracts for the regulator.
//!
//! Commands are the serialisable form of the mutation API so adapters and
//! fixtures can script a regulator from JSON. Each maps onto the method of the
//! same name on [`Regulator`](crate::Regulator).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Move targets, optionally teleporting values there.
    Animate {
        targets: IndexMap<String, f64>,
        #[serde(default)]
        jump: bool,
    },
    /// Set forced accelerations.
    Eddx { targets: IndexMap<String, f64> },
    /// Set forced velocities. `0` hands the property back to the spring.
    Edx { targets: IndexMap<String, f64> },
}

impl Command {
    pub fn animate<I, K>(targets: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self::Animate {
            targets: collect(targets),
            jump: false,
        }
    }

    pub fn jump<I, K>(targets: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self::Animate {
            targets: collect(targets),
            jump: true,
        }
    }

    pub fn eddx<I, K>(targets: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self::Eddx {
            targets: collect(targets),
        }
    }

    pub fn edx<I, K>(targets: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self::Edx {
            targets: collect(targets),
        }
    }
}

fn collect<I, K>(targets: I) -> IndexMap<String, f64>
where
    I: IntoIterator<Item = (K, f64)>,
    K: Into<String>,
{
    targets.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
