//! JNI carrier types as spelled in Swift thunks.

use crate::java::JavaType;

/// The Swift spelling of the JNI type carrying `ty`: `jlong`, `jstring?`,
/// `jbyteArray?`...
pub fn jni_type(ty: &JavaType) -> &'static str {
    match ty {
        JavaType::Boolean => "jboolean",
        JavaType::Byte => "jbyte",
        JavaType::Char => "jchar",
        JavaType::Short => "jshort",
        JavaType::Int => "jint",
        JavaType::Long => "jlong",
        JavaType::Float => "jfloat",
        JavaType::Double => "jdouble",
        JavaType::Void => "Void",
        JavaType::Array(element) if **element == JavaType::Byte => "jbyteArray?",
        JavaType::Array(_) => "jobjectArray?",
        JavaType::Class(_) if *ty == JavaType::string() => "jstring?",
        JavaType::Class(_) => "jobject?",
    }
}

/// The `Call<Type>MethodA` function invoking a Java method returning `ty`.
pub fn call_method(ty: &JavaType) -> &'static str {
    match ty {
        JavaType::Boolean => "CallBooleanMethodA",
        JavaType::Byte => "CallByteMethodA",
        JavaType::Char => "CallCharMethodA",
        JavaType::Short => "CallShortMethodA",
        JavaType::Int => "CallIntMethodA",
        JavaType::Long => "CallLongMethodA",
        JavaType::Float => "CallFloatMethodA",
        JavaType::Double => "CallDoubleMethodA",
        JavaType::Void => "CallVoidMethodA",
        JavaType::Array(_) | JavaType::Class(_) => "CallObjectMethodA",
    }
}

/// The JNI type of the integer that packs an optional `value_bits` wide
/// value with its discriminator, and the shift of the value.
///
/// `None` when twice the value width does not fit in 64 bits.
pub fn combined_carrier(value_bits: u32) -> Option<(JavaType, u32)> {
    if value_bits >= 64 || value_bits.saturating_mul(2) > 64 {
        return None;
    }
    let carrier = match value_bits {
        0..=8 => JavaType::Short,
        9..=16 => JavaType::Int,
        _ => JavaType::Long,
    };
    let shift = carrier.bit_width()? / 2;
    Some((carrier, shift))
}

/// The Swift integer type matching a primitive carrier.
pub fn swift_integer(carrier: &JavaType) -> &'static str {
    match carrier {
        JavaType::Byte => "Int8",
        JavaType::Short => "Int16",
        JavaType::Int => "Int32",
        _ => "Int64",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jni_types() {
        assert_eq!(jni_type(&JavaType::Long), "jlong");
        assert_eq!(jni_type(&JavaType::string()), "jstring?");
        assert_eq!(jni_type(&JavaType::array(JavaType::Byte)), "jbyteArray?");
        assert_eq!(jni_type(&JavaType::imported("MyClass")), "jobject?");
        assert_eq!(call_method(&JavaType::Boolean), "CallBooleanMethodA");
        assert_eq!(call_method(&JavaType::string()), "CallObjectMethodA");
    }

    #[test]
    fn test_combined_carrier() {
        assert_eq!(combined_carrier(8), Some((JavaType::Short, 8)));
        assert_eq!(combined_carrier(16), Some((JavaType::Int, 16)));
        assert_eq!(combined_carrier(32), Some((JavaType::Long, 32)));
        assert_eq!(combined_carrier(64), None);
        assert_eq!(swift_integer(&JavaType::Long), "Int64");
    }
}
