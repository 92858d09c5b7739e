use serde::Serialize;
use thiserror::Error;

/// Envelope version the controller expects on component updates.
pub const PARAMS_VERSION: &str = "1.0";

const MAX_UTILIZATION_PERCENT: f64 = 100.0;
const RSRQ_MIN: f64 = -20.0;
const RSRQ_MAX: f64 = -3.0;
const MIN_PERIOD_MS: f64 = 100.0;

/// Editable fields of the parameter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SourceDl,
    SourceUl,
    TargetDl,
    TargetUl,
    Rsrq,
    MinUe,
    MaxHoFrom,
    MaxHoTo,
    Every,
}

impl Field {
    /// Display order of the parameter panel.
    pub const ALL: [Field; 9] = [
        Field::SourceDl,
        Field::SourceUl,
        Field::TargetDl,
        Field::TargetUl,
        Field::Rsrq,
        Field::MinUe,
        Field::MaxHoFrom,
        Field::MaxHoTo,
        Field::Every,
    ];

    pub fn unit(&self) -> &'static str {
        match self {
            Field::SourceDl | Field::SourceUl | Field::TargetDl | Field::TargetUl => "%",
            Field::Rsrq => "dB",
            Field::Every => "ms",
            Field::MinUe | Field::MaxHoFrom | Field::MaxHoTo => "",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::SourceDl => "Source DL threshold",
            Field::SourceUl => "Source UL threshold",
            Field::TargetDl => "Target DL threshold",
            Field::TargetUl => "Target UL threshold",
            Field::Rsrq => "UE RSRQ threshold",
            Field::MinUe => "Minimum UEs",
            Field::MaxHoFrom => "Max handovers from a cell",
            Field::MaxHoTo => "Max handovers to a cell",
            Field::Every => "Evaluation period",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{} must be a number", .0.label())]
    NotANumber(Field),
    #[error("{} must be a whole number", .0.label())]
    NotAnInteger(Field),
    #[error("{} must not be negative", .0.label())]
    Negative(Field),
    #[error("{} must be < 100", .0.label())]
    AboveHundred(Field),
    #[error("UE RSRQ threshold must be within -3 and -20")]
    RsrqOutOfRange,
    #[error("Evaluation period (in ms.) must be greater than 100ms.")]
    PeriodTooShort,
}

/// Sparse parameter update: only fields the operator filled in are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParamPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s_dl_thr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s_ul_thr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_dl_thr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_ul_thr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsrq_thr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_ue: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ho_from: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ho_to: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub every: Option<u64>,
}

impl ParamPatch {
    pub fn is_empty(&self) -> bool {
        *self == ParamPatch::default()
    }
}

/// Body of the `PUT` request.
#[derive(Debug, Serialize)]
pub struct ParamEnvelope<'a> {
    pub version: &'static str,
    pub params: &'a ParamPatch,
}

impl<'a> ParamEnvelope<'a> {
    pub fn new(params: &'a ParamPatch) -> Self {
        Self {
            version: PARAMS_VERSION,
            params,
        }
    }
}

/// Raw contents of the parameter form, as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamForm {
    /// Radio selection; `None` until the operator picks one.
    pub load_balance: Option<bool>,
    pub s_dl_thr: String,
    pub s_ul_thr: String,
    pub t_dl_thr: String,
    pub t_ul_thr: String,
    pub rsrq_thr: String,
    pub min_ue: String,
    pub max_ho_from: String,
    pub max_ho_to: String,
    pub every: String,
}

impl ParamForm {
    /// Check every non-empty field and build the sparse patch. The first
    /// violation aborts the whole submission.
    pub fn validate(&self) -> Result<ParamPatch, ValidationError> {
        let s_dl_thr = utilization(&self.s_dl_thr, Field::SourceDl)?;
        let s_ul_thr = utilization(&self.s_ul_thr, Field::SourceUl)?;
        let t_dl_thr = utilization(&self.t_dl_thr, Field::TargetDl)?;
        let t_ul_thr = utilization(&self.t_ul_thr, Field::TargetUl)?;

        let rsrq_thr = number(&self.rsrq_thr, Field::Rsrq)?;
        if let Some(rsrq) = rsrq_thr {
            if !(RSRQ_MIN..=RSRQ_MAX).contains(&rsrq) {
                return Err(ValidationError::RsrqOutOfRange);
            }
        }

        let every = match number(&self.every, Field::Every)? {
            Some(period) if period < MIN_PERIOD_MS => return Err(ValidationError::PeriodTooShort),
            Some(period) if period.fract() != 0.0 => {
                return Err(ValidationError::NotAnInteger(Field::Every));
            }
            Some(period) => Some(period as u64),
            None => None,
        };

        Ok(ParamPatch {
            load_balance: self.load_balance,
            s_dl_thr,
            s_ul_thr,
            t_dl_thr,
            t_ul_thr,
            rsrq_thr,
            min_ue: count(&self.min_ue, Field::MinUe)?,
            max_ho_from: count(&self.max_ho_from, Field::MaxHoFrom)?,
            max_ho_to: count(&self.max_ho_to, Field::MaxHoTo)?,
            every,
        })
    }

    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::SourceDl => &mut self.s_dl_thr,
            Field::SourceUl => &mut self.s_ul_thr,
            Field::TargetDl => &mut self.t_dl_thr,
            Field::TargetUl => &mut self.t_ul_thr,
            Field::Rsrq => &mut self.rsrq_thr,
            Field::MinUe => &mut self.min_ue,
            Field::MaxHoFrom => &mut self.max_ho_from,
            Field::MaxHoTo => &mut self.max_ho_to,
            Field::Every => &mut self.every,
        }
    }

    pub fn clear(&mut self) {
        *self = ParamForm::default();
    }

    pub fn is_blank(&self) -> bool {
        *self == ParamForm::default()
    }
}

fn number(raw: &str, field: Field) -> Result<Option<f64>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(ValidationError::NotANumber(field)),
    }
}

fn utilization(raw: &str, field: Field) -> Result<Option<f64>, ValidationError> {
    match number(raw, field)? {
        Some(value) if value > MAX_UTILIZATION_PERCENT => Err(ValidationError::AboveHundred(field)),
        Some(value) if value < 0.0 => Err(ValidationError::Negative(field)),
        other => Ok(other),
    }
}

fn count(raw: &str, field: Field) -> Result<Option<u32>, ValidationError> {
    match number(raw, field)? {
        Some(value) if value < 0.0 => Err(ValidationError::Negative(field)),
        Some(value) if value.fract() != 0.0 || value > u32::MAX as f64 => {
            Err(ValidationError::NotAnInteger(field))
        }
        Some(value) => Ok(Some(value as u32)),
        None => Ok(None),
    }
}
