use super::*;

/// `eth_submitLogin` params: `[worker, password, ...]`. Anything after the
/// password (some miners send an email) is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitLogin {
    pub worker: String,
    pub password: String,
}

impl Serialize for SubmitLogin {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (&self.worker, &self.password).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SubmitLogin {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let params = Vec::<Value>::deserialize(deserializer)?;

        match params.as_slice() {
            [Value::String(worker), Value::String(password), ..] => Ok(SubmitLogin {
                worker: worker.clone(),
                password: password.clone(),
            }),
            _ => Err(de::Error::custom(
                "expected at least worker and password strings",
            )),
        }
    }
}
