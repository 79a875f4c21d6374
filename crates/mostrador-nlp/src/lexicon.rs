//! Keyword buckets.
//!
//! Every term is stored in normalized form and matched as a whole word or
//! whole phrase against normalized text.

pub const GREETINGS: &[&str] = &[
    "hola",
    "holaa",
    "buenas",
    "buen dia",
    "buenos dias",
    "buenas tardes",
    "buenas noches",
    "que tal",
    "hey",
    "hi",
    "hello",
];

/// Pleasantries that may follow a greeting without turning it into a question.
pub const PLEASANTRIES: &[&str] = &["como estas", "como andas", "como va", "todo bien", "que tal"];

pub const PRICE: &[&str] = &[
    "precio",
    "precios",
    "cuanto",
    "cuanto sale",
    "cuanto cuesta",
    "cuesta",
    "cuestan",
    "sale",
    "salen",
    "vale",
    "valen",
    "valor",
    "costo",
    "coste",
];

pub const PROMOS: &[&str] = &[
    "promo",
    "promos",
    "promocion",
    "promociones",
    "oferta",
    "ofertas",
    "descuento",
    "descuentos",
    "rebaja",
    "rebajas",
    "liquidacion",
    "cupon",
    "cupones",
    "hot sale",
    "hotsale",
    "cyber",
    "cyber monday",
    "black friday",
];

/// Terms that, together with a transfer term, describe a payment-method discount.
pub const DISCOUNT: &[&str] = &["descuento", "descuentos", "off", "rebaja", "bonificacion"];

pub const TRANSFER: &[&str] = &[
    "transferencia",
    "transferencias",
    "transferir",
    "transfiero",
    "deposito",
    "cbu",
    "alias",
];

pub const INSTALLMENTS: &[&str] = &[
    "cuota",
    "cuotas",
    "sin interes",
    "sin intereses",
    "financiacion",
    "financiar",
    "financian",
];

pub const PAYMENTS: &[&str] = &[
    "pago",
    "pagos",
    "pagar",
    "abonar",
    "medio de pago",
    "medios de pago",
    "transferencia",
    "transferencias",
    "tarjeta",
    "tarjetas",
    "debito",
    "credito",
    "efectivo",
    "rapipago",
    "pago facil",
    "pagofacil",
    "mercado pago",
    "mercadopago",
];

pub const SHIPPING: &[&str] = &[
    "envio",
    "envios",
    "enviar",
    "envian",
    "entrega",
    "entregas",
    "codigo postal",
    "cp",
    "correo",
    "andreani",
    "oca",
    "domicilio",
    "retiro",
    "retirar",
    "sucursal",
    "despacho",
    "demora",
];

pub const ORDER: &[&str] = &[
    "pedido",
    "pedidos",
    "mi pedido",
    "numero de pedido",
    "nro de pedido",
    "mi compra",
    "mi orden",
    "seguimiento",
    "tracking",
    "no me llego",
    "no llego",
    "llego mi",
];

pub const OZONE: &[&str] = &[
    "ozone",
    "ozone lifestyle",
    "sunstick",
    "sun stick",
    "sun-stick",
    "protector solar",
    "protectores solares",
    "kids",
];

pub const KIDS: &[&str] = &["kids", "kid", "nino", "ninos", "nina", "ninas", "chicos", "infantil"];

/// "How does it look on skin" vocabulary for the stick sub-intent.
pub const LOOK: &[&str] = &[
    "mancha",
    "manchas",
    "mancha la ropa",
    "deja blanco",
    "deja blanca",
    "deja color",
    "queda blanco",
    "queda blanca",
    "como queda",
    "se nota",
    "rastro",
    "marca",
];

pub const INFO: &[&str] = &[
    "para que sirve",
    "sirve para",
    "que hace",
    "beneficio",
    "beneficios",
    "ingrediente",
    "ingredientes",
    "componentes",
    "modo de uso",
    "como se usa",
    "como usar",
    "como lo uso",
    "como la uso",
    "rutina",
    "informacion",
    "info",
];

/// Questions about sun protection factor.
pub const FAQ: &[&str] = &[
    "spf",
    "fps",
    "factor",
    "tiene spf",
    "tiene fps",
    "tiene proteccion",
    "protege del sol",
    "resistente al agua",
    "water resistant",
];

/// Product wording that implies sun protection.
pub const SPF_POSITIVE: &[&str] = &[
    "spf",
    "fps",
    "proteccion solar",
    "protector solar",
    "filtro solar",
    "factor de proteccion",
    "uva",
    "uvb",
];

pub const SUN: &[&str] = &[
    "sol",
    "solar",
    "proteccion solar",
    "protector",
    "playa",
    "pileta",
    "verano",
    "uv",
    "rayos",
    "bronceado",
    "quemadura",
];

/// Product lines and house brands customers name directly.
pub const PRODUCT_LINES: &[&str] = &[
    "mtb",
    "iuven",
    "serum",
    "piel iluminada",
    "iluminada",
    "pocket",
    "corporal",
    "sunstick",
    "kit",
    "kits",
];

/// Words that mark a greeting as carrying a real question.
pub fn greeting_hints() -> impl Iterator<Item = &'static str> {
    [PRICE, SHIPPING, PAYMENTS, INSTALLMENTS, PROMOS, ORDER, FAQ, OZONE, INFO, PRODUCT_LINES]
        .into_iter()
        .flatten()
        .copied()
}

/// Filler removed from product queries.
pub const STOPWORDS: &[&str] = &[
    "a", "al", "algo", "con", "de", "del", "el", "en", "es", "esa", "ese", "esta", "este", "hay",
    "la", "las", "lo", "los", "me", "mi", "para", "por", "porfa", "que", "quiero", "queria",
    "saber", "se", "su", "tenes", "tienen", "un", "una", "y", "o", "favor", "gracias", "hola",
    "buenas", "dia", "dias", "tardes", "noches", "producto", "productos",
];

/// Bare measurement units removed from product queries.
pub const UNITS: &[&str] = &["ml", "gr", "g", "grs", "cc", "kg", "oz", "l", "lt", "mg", "unidades", "u"];

/// Words that distinguish one variant of a product from another.
pub const VARIANT_TERMS: &[&str] = &[
    "pocket",
    "corporal",
    "facial",
    "mini",
    "grande",
    "chico",
    "kids",
    "light",
    "medium",
    "dark",
    "blanco",
    "negro",
    "azul",
    "verde",
    "rosa",
    "amarillo",
    "naranja",
    "violeta",
    "nude",
    "color",
    "repuesto",
    "recarga",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn test_every_term_is_normalized() {
        let buckets: &[&[&str]] = &[
            GREETINGS, PLEASANTRIES, PRICE, PROMOS, DISCOUNT, TRANSFER, INSTALLMENTS, PAYMENTS,
            SHIPPING, ORDER, OZONE, KIDS, LOOK, INFO, FAQ, SUN, STOPWORDS, UNITS, VARIANT_TERMS,
        ];
        for bucket in buckets {
            for term in bucket.iter() {
                assert_eq!(normalize(term), *term, "term {term:?} is not normalized");
            }
        }
    }

    #[test]
    fn test_sale_is_a_price_term_not_a_promo_term() {
        assert!(PRICE.contains(&"sale"));
        assert!(!PROMOS.contains(&"sale"));
    }
}
