use std::fmt::Debug;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::network::network_graph::GraphData;

/// Current handover parameters as reported by the controller. Every field is
/// optional on the wire; numbers are kept as `f64` so that integer and float
/// encodings both parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamValues {
    #[serde(default)]
    pub load_balance: Option<bool>,
    #[serde(default)]
    pub s_dl_thr: Option<f64>,
    #[serde(default)]
    pub s_ul_thr: Option<f64>,
    #[serde(default)]
    pub t_dl_thr: Option<f64>,
    #[serde(default)]
    pub t_ul_thr: Option<f64>,
    #[serde(default)]
    pub rsrq_thr: Option<f64>,
    #[serde(default)]
    pub min_ue: Option<f64>,
    #[serde(default)]
    pub max_ho_from: Option<f64>,
    #[serde(default)]
    pub max_ho_to: Option<f64>,
    #[serde(default)]
    pub every: Option<f64>,
}

/// One answer of the component resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "graphData", default)]
    pub graph_data: GraphData,
    #[serde(flatten)]
    pub params: ParamValues,
    #[serde(default)]
    pub base_auth_usr: Option<String>,
    #[serde(default)]
    pub base_auth_pwd: Option<String>,
}

impl Snapshot {
    /// Credentials to use for parameter updates, if the controller sent any.
    pub fn credentials(&self) -> Option<BasicAuth> {
        match (&self.base_auth_usr, &self.base_auth_pwd) {
            (Some(user), Some(password)) => Some(BasicAuth::new(user, password)),
            _ => None,
        }
    }
}

/// HTTP Basic credentials handed out by the controller on every poll.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    user: String,
    password: String,
}

impl BasicAuth {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", self.user, self.password)))
    }
}

impl Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}
