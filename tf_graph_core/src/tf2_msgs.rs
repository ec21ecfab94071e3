use serde_derive::{Deserialize, Serialize};

use crate::geometry_msgs::TransformStamped;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TFMessage {
    pub transforms: Vec<TransformStamped>,
}
