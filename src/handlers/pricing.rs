use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::pricing_service::{PricingService, PricingTier, TierRef, VariantTiers};
use crate::application::BulkOutcome;
use crate::domain::inventory::VariantKey;
use crate::domain::pricing::{
    AppliedRule, PriceResult, PricingRule, PricingRuleDraft, PricingRulePatch, RuleType,
};
use crate::errors::AppError;
use crate::infrastructure::pg_store::PgStore;

use super::{parse_money, parse_money_opt};

pub type Pricing = PricingService<PgStore>;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePricingRuleRequest {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    /// Defaults to 1.
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
    pub unit_price: String,
    /// 0 to 100, as a decimal string.
    pub discount_percentage: Option<String>,
    pub rule_name: Option<String>,
    /// Defaults to STANDARD.
    pub rule_type: Option<RuleType>,
    pub is_active: Option<bool>,
    /// Defaults to 1.
    pub priority: Option<i32>,
}

impl CreatePricingRuleRequest {
    fn into_draft(self) -> Result<PricingRuleDraft, AppError> {
        Ok(PricingRuleDraft {
            product_id: self.product_id,
            color_id: self.color_id,
            size_id: self.size_id,
            min_quantity: self.min_quantity.unwrap_or(1),
            max_quantity: self.max_quantity,
            unit_price: parse_money("unitPrice", &self.unit_price)?,
            discount_percentage: parse_money_opt(
                "discountPercentage",
                self.discount_percentage.as_deref(),
            )?,
            rule_name: self.rule_name,
            rule_type: self.rule_type.unwrap_or(RuleType::Standard),
            is_active: self.is_active.unwrap_or(true),
            priority: self.priority.unwrap_or(1),
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TierRequest {
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub unit_price: String,
    pub discount_percentage: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VariantTiersRequest {
    pub color_id: i32,
    pub size_id: i32,
    pub tiers: Vec<TierRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkPricingRequest {
    pub variants: Vec<VariantTiersRequest>,
}

impl BulkPricingRequest {
    fn into_variants(self) -> Result<Vec<VariantTiers>, AppError> {
        self.variants
            .into_iter()
            .map(|v| {
                let tiers = v
                    .tiers
                    .into_iter()
                    .map(|t| {
                        Ok(PricingTier {
                            min_quantity: t.min_quantity,
                            max_quantity: t.max_quantity,
                            unit_price: parse_money("unitPrice", &t.unit_price)?,
                            discount_percentage: parse_money_opt(
                                "discountPercentage",
                                t.discount_percentage.as_deref(),
                            )?,
                        })
                    })
                    .collect::<Result<Vec<_>, AppError>>()?;
                Ok(VariantTiers {
                    color_id: v.color_id,
                    size_id: v.size_id,
                    tiers,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculatePriceRequest {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub quantity: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePricingRuleRequest {
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
    pub unit_price: Option<String>,
    pub discount_percentage: Option<String>,
    pub rule_name: Option<String>,
    pub rule_type: Option<RuleType>,
    pub is_active: Option<bool>,
    pub priority: Option<i32>,
}

impl UpdatePricingRuleRequest {
    fn into_patch(self) -> Result<PricingRulePatch, AppError> {
        Ok(PricingRulePatch {
            min_quantity: self.min_quantity,
            max_quantity: self.max_quantity,
            unit_price: parse_money_opt("unitPrice", self.unit_price.as_deref())?,
            discount_percentage: parse_money_opt(
                "discountPercentage",
                self.discount_percentage.as_deref(),
            )?,
            rule_name: self.rule_name,
            rule_type: self.rule_type,
            is_active: self.is_active,
            priority: self.priority,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricingRuleResponse {
    pub id: i32,
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub unit_price: String,
    pub discount_percentage: Option<String>,
    pub rule_name: Option<String>,
    pub rule_type: RuleType,
    pub is_active: bool,
    pub priority: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PricingRule> for PricingRuleResponse {
    fn from(r: PricingRule) -> Self {
        Self {
            id: r.id,
            product_id: r.product_id,
            color_id: r.color_id,
            size_id: r.size_id,
            min_quantity: r.min_quantity,
            max_quantity: r.max_quantity,
            unit_price: r.unit_price.to_string(),
            discount_percentage: r.discount_percentage.map(|d| d.to_string()),
            rule_name: r.rule_name,
            rule_type: r.rule_type,
            is_active: r.is_active,
            priority: r.priority,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub quantity: i32,
    pub unit_price: String,
    pub effective_unit_price: String,
    pub total_price: String,
    pub discount_percentage: Option<String>,
    pub discount_amount: String,
    pub applied_rule: AppliedRule,
}

impl From<PriceResult> for PriceResponse {
    fn from(p: PriceResult) -> Self {
        Self {
            product_id: p.product_id,
            color_id: p.color_id,
            size_id: p.size_id,
            quantity: p.quantity,
            unit_price: p.unit_price.to_string(),
            effective_unit_price: p.effective_unit_price.to_string(),
            total_price: p.total_price.to_string(),
            discount_percentage: p.discount_percentage.map(|d| d.to_string()),
            discount_amount: p.discount_amount.to_string(),
            applied_rule: p.applied_rule,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkPricingFailure {
    pub color_id: i32,
    pub size_id: i32,
    /// Absent when the whole variant was rejected.
    pub min_quantity: Option<i32>,
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkPricingResponse {
    pub created: usize,
    pub errors_count: usize,
    pub items: Vec<PricingRuleResponse>,
    pub errors: Vec<BulkPricingFailure>,
}

impl From<BulkOutcome<PricingRule, TierRef>> for BulkPricingResponse {
    fn from(outcome: BulkOutcome<PricingRule, TierRef>) -> Self {
        Self {
            created: outcome.created.len(),
            errors_count: outcome.errors.len(),
            items: outcome.created.into_iter().map(Into::into).collect(),
            errors: outcome
                .errors
                .into_iter()
                .map(|f| BulkPricingFailure {
                    color_id: f.input.color_id,
                    size_id: f.input.size_id,
                    min_quantity: f.input.tier.map(|t| t.min_quantity),
                    error: f.error.to_string(),
                })
                .collect(),
        }
    }
}

fn to_responses(rules: Vec<PricingRule>) -> Vec<PricingRuleResponse> {
    rules.into_iter().map(PricingRuleResponse::from).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /pricing/rules
#[utoipa::path(
    post,
    path = "/pricing/rules",
    request_body = CreatePricingRuleRequest,
    responses(
        (status = 201, description = "Rule created", body = PricingRuleResponse),
        (status = 400, description = "Invalid rule"),
        (status = 404, description = "Unknown product, color or size"),
        (status = 409, description = "An active rule already covers this tier"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pricing"
)]
pub async fn create_rule(
    service: web::Data<Pricing>,
    body: web::Json<CreatePricingRuleRequest>,
) -> Result<HttpResponse, AppError> {
    let draft = body.into_inner().into_draft()?;
    let rule = web::block(move || service.create_rule(draft)).await??;
    Ok(HttpResponse::Created().json(PricingRuleResponse::from(rule)))
}

/// POST /pricing/product/{productId}/rules/bulk
///
/// Creates a VARIANT rule per tier. Failures are reported per entry and do
/// not undo the entries that succeeded.
#[utoipa::path(
    post,
    path = "/pricing/product/{productId}/rules/bulk",
    params(
        ("productId" = i32, Path, description = "Product id"),
    ),
    request_body = BulkPricingRequest,
    responses(
        (status = 201, description = "Import finished", body = BulkPricingResponse),
        (status = 404, description = "Unknown product"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pricing"
)]
pub async fn bulk_create_rules(
    service: web::Data<Pricing>,
    path: web::Path<i32>,
    body: web::Json<BulkPricingRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let variants = body.into_inner().into_variants()?;
    let outcome = web::block(move || service.bulk_create_rules(product_id, variants)).await??;
    Ok(HttpResponse::Created().json(BulkPricingResponse::from(outcome)))
}

/// POST /pricing/calculate
#[utoipa::path(
    post,
    path = "/pricing/calculate",
    request_body = CalculatePriceRequest,
    responses(
        (status = 200, description = "Resolved price", body = PriceResponse),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "Unknown product"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pricing"
)]
pub async fn calculate_price(
    service: web::Data<Pricing>,
    body: web::Json<CalculatePriceRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let key = VariantKey::new(req.product_id, req.color_id, req.size_id);
    let price = web::block(move || service.calculate_price(key, req.quantity)).await??;
    Ok(HttpResponse::Ok().json(PriceResponse::from(price)))
}

/// GET /pricing/product/{productId}/rules
#[utoipa::path(
    get,
    path = "/pricing/product/{productId}/rules",
    params(
        ("productId" = i32, Path, description = "Product id"),
    ),
    responses(
        (status = 200, description = "Rules by priority", body = [PricingRuleResponse]),
        (status = 404, description = "Unknown product"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pricing"
)]
pub async fn list_rules(
    service: web::Data<Pricing>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let rules = web::block(move || service.list_rules(product_id)).await??;
    Ok(HttpResponse::Ok().json(to_responses(rules)))
}

/// GET /pricing/product/{productId}/rules/type/{ruleType}
#[utoipa::path(
    get,
    path = "/pricing/product/{productId}/rules/type/{ruleType}",
    params(
        ("productId" = i32, Path, description = "Product id"),
        ("ruleType" = String, Path, description = "STANDARD, BULK, VARIANT, VIP or WHOLESALE"),
    ),
    responses(
        (status = 200, description = "Active rules of the type", body = [PricingRuleResponse]),
        (status = 400, description = "Unknown rule type"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pricing"
)]
pub async fn list_rules_by_type(
    service: web::Data<Pricing>,
    path: web::Path<(i32, String)>,
) -> Result<HttpResponse, AppError> {
    let (product_id, rule_type) = path.into_inner();
    let rule_type: RuleType = rule_type.parse()?;
    let rules = web::block(move || service.list_rules_by_type(product_id, rule_type)).await??;
    Ok(HttpResponse::Ok().json(to_responses(rules)))
}

/// PATCH /pricing/rules/{id}
#[utoipa::path(
    patch,
    path = "/pricing/rules/{id}",
    params(
        ("id" = i32, Path, description = "Rule id"),
    ),
    request_body = UpdatePricingRuleRequest,
    responses(
        (status = 200, description = "Rule updated", body = PricingRuleResponse),
        (status = 400, description = "Resulting rule is invalid"),
        (status = 404, description = "Rule not found"),
        (status = 409, description = "Another active rule covers this tier"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pricing"
)]
pub async fn update_rule(
    service: web::Data<Pricing>,
    path: web::Path<i32>,
    body: web::Json<UpdatePricingRuleRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let patch = body.into_inner().into_patch()?;
    let rule = web::block(move || service.update_rule(id, patch)).await??;
    Ok(HttpResponse::Ok().json(PricingRuleResponse::from(rule)))
}

/// DELETE /pricing/rules/{id}
#[utoipa::path(
    delete,
    path = "/pricing/rules/{id}",
    params(
        ("id" = i32, Path, description = "Rule id"),
    ),
    responses(
        (status = 204, description = "Rule deleted"),
        (status = 404, description = "Rule not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pricing"
)]
pub async fn delete_rule(
    service: web::Data<Pricing>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || service.delete_rule(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    #[test]
    fn create_request_fills_defaults() {
        let req: CreatePricingRuleRequest =
            serde_json::from_str(r#"{"productId": 3, "unitPrice": "45"}"#).expect("valid");
        let draft = req.into_draft().expect("valid draft");
        assert_eq!(draft.min_quantity, 1);
        assert_eq!(draft.rule_type, RuleType::Standard);
        assert!(draft.is_active);
        assert_eq!(draft.priority, 1);
        assert_eq!(draft.unit_price, BigDecimal::from(45));
    }

    #[test]
    fn bulk_request_rejects_bad_tier_price() {
        let req: BulkPricingRequest = serde_json::from_str(
            r#"{"variants":[{"colorId":1,"sizeId":2,"tiers":[{"minQuantity":1,"unitPrice":"x"}]}]}"#,
        )
        .expect("valid json");
        assert!(matches!(req.into_variants(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn rule_type_accepts_screaming_case() {
        let req: UpdatePricingRuleRequest =
            serde_json::from_str(r#"{"ruleType":"WHOLESALE"}"#).expect("valid");
        assert_eq!(
            req.into_patch().expect("patch").rule_type,
            Some(RuleType::Wholesale)
        );
    }
}
