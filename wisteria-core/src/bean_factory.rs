//! Bean 工厂
//!
//! 定义注册表与容器的 trait 分层，以及贯通全栈的默认实现
//! [`DefaultListableBeanFactory`]。`get_bean` 的创建流程：
//! 单例缓存直读 → 定义查找 → 构造器选择 → 策略实例化 → 属性填充 →
//! 实例级后置处理 → 单例登记。
//!
//! 注意：不检测循环引用，相互引用的定义会无界递归。

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use parking_lot::RwLock;

use crate::bean::{BeanDefinition, BeanInstance, BoxedBean, BeanValue};
use crate::bean_class::BeanClass;
use crate::error::{ContainerError, ContainerResult};
use crate::instantiation::{InstantiationStrategy, SubclassingInstantiationStrategy};
use crate::lifecycle::BeanPostProcessor;
use crate::singleton::{DefaultSingletonBeanRegistry, SingletonBeanRegistry};

/// 容器的最小检索契约
pub trait BeanFactory: Send + Sync {
    /// 按名称获取 Bean，必要时创建
    fn get_bean(&self, bean_name: &str) -> ContainerResult<BeanInstance>;

    /// 按名称获取 Bean，携带显式构造参数
    ///
    /// 参数只在首次创建时生效；命中单例缓存时被忽略
    fn get_bean_with_args(
        &self,
        bean_name: &str,
        args: Vec<BoxedBean>,
    ) -> ContainerResult<BeanInstance>;

    /// 名称是否有对应的定义
    fn contains_bean(&self, bean_name: &str) -> bool;
}

/// 可枚举的容器契约
pub trait ListableBeanFactory: BeanFactory {
    /// 所有定义名称，注册顺序
    fn bean_definition_names(&self) -> Vec<String>;

    /// 按类型（精确或标记）筛选定义名称，注册顺序
    fn bean_names_for_type(&self, type_id: TypeId) -> Vec<String>;

    /// 获取某类型的全部实例，键为 Bean 名称
    fn get_beans_for_type(
        &self,
        type_id: TypeId,
    ) -> ContainerResult<HashMap<String, BeanInstance>>;
}

/// 定义注册表契约
///
/// `register_bean_definition` 是无条件覆盖；重名拒绝属于加载器
/// （[`crate::reader::BeanDefinitionReader`]）的策略，不在这里做
pub trait BeanDefinitionRegistry: Send + Sync {
    fn register_bean_definition(&self, bean_name: &str, definition: BeanDefinition);

    fn get_bean_definition(&self, bean_name: &str) -> ContainerResult<BeanDefinition>;

    fn contains_bean_definition(&self, bean_name: &str) -> bool;

    fn bean_definition_count(&self) -> usize;
}

/// 可配置的容器契约
pub trait ConfigurableBeanFactory: BeanFactory {
    /// 追加实例级后置处理器，列表按 `order()` 稳定排序
    fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>);

    /// 当前处理器列表快照
    fn bean_post_processors(&self) -> Vec<Arc<dyn BeanPostProcessor>>;

    /// 替换实例化策略
    fn set_instantiation_strategy(&self, strategy: Arc<dyn InstantiationStrategy>);
}

/// 完整的容器配置视图：工厂级后置处理器收到的就是它
pub trait ConfigurableListableBeanFactory:
    ListableBeanFactory + ConfigurableBeanFactory + BeanDefinitionRegistry
{
    /// 预实例化所有单例；名称快照在进入时采集，首个失败即中止
    fn preinstantiate_singletons(&self) -> ContainerResult<()>;
}

/// 默认工厂实现
///
/// 所有共享状态用短临界区的 `RwLock` 保护；回调和递归 `get_bean`
/// 之前一律先把数据克隆出锁
pub struct DefaultListableBeanFactory {
    definitions: RwLock<HashMap<String, BeanDefinition>>,
    /// 与 `definitions` 同步维护的注册顺序
    definition_names: RwLock<Vec<String>>,
    singletons: DefaultSingletonBeanRegistry,
    bean_post_processors: RwLock<Vec<Arc<dyn BeanPostProcessor>>>,
    instantiation_strategy: RwLock<Arc<dyn InstantiationStrategy>>,
}

impl Default for DefaultListableBeanFactory {
    fn default() -> Self {
        Self {
            definitions: RwLock::new(HashMap::new()),
            definition_names: RwLock::new(Vec::new()),
            singletons: DefaultSingletonBeanRegistry::new(),
            bean_post_processors: RwLock::new(Vec::new()),
            instantiation_strategy: RwLock::new(Arc::new(SubclassingInstantiationStrategy)),
        }
    }
}

impl DefaultListableBeanFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn do_get_bean(&self, bean_name: &str, args: Vec<BoxedBean>) -> ContainerResult<BeanInstance> {
        tracing::trace!("Requesting bean '{}'", bean_name);
        if let Some(singleton) = self.singletons.get_singleton(bean_name) {
            tracing::debug!("Returning cached instance of singleton bean '{}'", bean_name);
            return Ok(singleton);
        }
        let definition = self.get_bean_definition(bean_name)?;
        self.create_bean(bean_name, &definition, args)
    }

    fn create_bean(
        &self,
        bean_name: &str,
        definition: &BeanDefinition,
        args: Vec<BoxedBean>,
    ) -> ContainerResult<BeanInstance> {
        tracing::info!("Creating shared instance of singleton bean '{}'", bean_name);
        let mut instance = self.create_bean_instance(bean_name, definition, args)?;
        self.populate_bean(bean_name, definition, instance.as_mut())?;

        let mut bean: BeanInstance = Arc::from(instance);
        bean = self.apply_post_processors_before_initialization(bean, bean_name)?;
        bean = self.apply_post_processors_after_initialization(bean, bean_name)?;

        self.register_singleton(bean_name, Arc::clone(&bean));
        Ok(bean)
    }

    fn create_bean_instance(
        &self,
        bean_name: &str,
        definition: &BeanDefinition,
        args: Vec<BoxedBean>,
    ) -> ContainerResult<BoxedBean> {
        let strategy = Arc::clone(&*self.instantiation_strategy.read());
        if args.is_empty() {
            return strategy.instantiate(definition, bean_name, None, args);
        }
        let bean_class = definition.bean_class();
        let constructor = bean_class.resolve_constructor(&args).ok_or_else(|| {
            ContainerError::BeanInstantiation {
                type_name: bean_class.name().to_string(),
                reason: format!(
                    "no declared constructor matches the {} supplied argument(s)",
                    args.len()
                ),
            }
        })?;
        strategy.instantiate(definition, bean_name, Some(constructor), args)
    }

    /// 按记录顺序填充属性；引用属性递归解析
    fn populate_bean(
        &self,
        bean_name: &str,
        definition: &BeanDefinition,
        instance: &mut dyn Any,
    ) -> ContainerResult<()> {
        for property_value in definition.property_values() {
            let value: BeanInstance = match property_value.value() {
                BeanValue::Reference(reference) => {
                    tracing::trace!(
                        "Resolving reference '{}' for property '{}' of bean '{}'",
                        reference.bean_name(),
                        property_value.name(),
                        bean_name
                    );
                    self.get_bean(reference.bean_name()).map_err(|err| {
                        ContainerError::BeanPopulation {
                            bean_name: bean_name.to_string(),
                            reason: format!(
                                "failed to resolve reference '{}' for property '{}': {}",
                                reference.bean_name(),
                                property_value.name(),
                                err
                            ),
                        }
                    })?
                }
                BeanValue::Literal(literal) => Arc::clone(literal),
            };
            definition
                .bean_class()
                .set_property(instance, property_value.name(), value)
                .map_err(|reason| ContainerError::BeanPopulation {
                    bean_name: bean_name.to_string(),
                    reason,
                })?;
        }
        Ok(())
    }

    fn apply_post_processors_before_initialization(
        &self,
        mut bean: BeanInstance,
        bean_name: &str,
    ) -> ContainerResult<BeanInstance> {
        for processor in self.bean_post_processors() {
            tracing::trace!(
                "Applying post processor '{}' before initialization of bean '{}'",
                processor.name(),
                bean_name
            );
            bean = processor.post_process_before_initialization(bean, bean_name)?;
        }
        Ok(bean)
    }

    fn apply_post_processors_after_initialization(
        &self,
        mut bean: BeanInstance,
        bean_name: &str,
    ) -> ContainerResult<BeanInstance> {
        for processor in self.bean_post_processors() {
            tracing::trace!(
                "Applying post processor '{}' after initialization of bean '{}'",
                processor.name(),
                bean_name
            );
            bean = processor.post_process_after_initialization(bean, bean_name)?;
        }
        Ok(bean)
    }

    /// 按注册顺序筛选满足条件的定义名称
    fn names_matching(&self, predicate: impl Fn(&BeanClass) -> bool) -> Vec<String> {
        let names = self.definition_names.read().clone();
        let definitions = self.definitions.read();
        names
            .into_iter()
            .filter(|name| {
                definitions
                    .get(name)
                    .map(|definition| predicate(definition.bean_class()))
                    .unwrap_or(false)
            })
            .collect()
    }

    pub(crate) fn registry_post_processor_names(&self) -> Vec<String> {
        self.names_matching(|class| class.provides_registry_post_processor())
    }

    pub(crate) fn factory_post_processor_names(&self) -> Vec<String> {
        self.names_matching(|class| class.provides_factory_post_processor())
    }

    pub(crate) fn bean_post_processor_names(&self) -> Vec<String> {
        self.names_matching(|class| class.provides_bean_post_processor())
    }
}

impl SingletonBeanRegistry for DefaultListableBeanFactory {
    fn register_singleton(&self, bean_name: &str, singleton: BeanInstance) {
        self.singletons.register_singleton(bean_name, singleton);
    }

    fn get_singleton(&self, bean_name: &str) -> Option<BeanInstance> {
        self.singletons.get_singleton(bean_name)
    }

    fn contains_singleton(&self, bean_name: &str) -> bool {
        self.singletons.contains_singleton(bean_name)
    }
}

impl BeanFactory for DefaultListableBeanFactory {
    fn get_bean(&self, bean_name: &str) -> ContainerResult<BeanInstance> {
        self.do_get_bean(bean_name, Vec::new())
    }

    fn get_bean_with_args(
        &self,
        bean_name: &str,
        args: Vec<BoxedBean>,
    ) -> ContainerResult<BeanInstance> {
        self.do_get_bean(bean_name, args)
    }

    fn contains_bean(&self, bean_name: &str) -> bool {
        self.contains_bean_definition(bean_name)
    }
}

impl ListableBeanFactory for DefaultListableBeanFactory {
    fn bean_definition_names(&self) -> Vec<String> {
        self.definition_names.read().clone()
    }

    fn bean_names_for_type(&self, type_id: TypeId) -> Vec<String> {
        self.names_matching(|class| class.is_assignable_to(type_id))
    }

    fn get_beans_for_type(
        &self,
        type_id: TypeId,
    ) -> ContainerResult<HashMap<String, BeanInstance>> {
        let mut beans = HashMap::new();
        for name in self.bean_names_for_type(type_id) {
            let bean = self.get_bean(&name)?;
            beans.insert(name, bean);
        }
        Ok(beans)
    }
}

impl BeanDefinitionRegistry for DefaultListableBeanFactory {
    fn register_bean_definition(&self, bean_name: &str, definition: BeanDefinition) {
        let mut definitions = self.definitions.write();
        if definitions
            .insert(bean_name.to_string(), definition)
            .is_none()
        {
            self.definition_names.write().push(bean_name.to_string());
            tracing::debug!("Registered bean definition '{}'", bean_name);
        } else {
            tracing::debug!("Overriding bean definition '{}'", bean_name);
        }
    }

    fn get_bean_definition(&self, bean_name: &str) -> ContainerResult<BeanDefinition> {
        self.definitions
            .read()
            .get(bean_name)
            .cloned()
            .ok_or_else(|| ContainerError::NoSuchBeanDefinition(bean_name.to_string()))
    }

    fn contains_bean_definition(&self, bean_name: &str) -> bool {
        self.definitions.read().contains_key(bean_name)
    }

    fn bean_definition_count(&self) -> usize {
        self.definitions.read().len()
    }
}

impl ConfigurableBeanFactory for DefaultListableBeanFactory {
    fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        tracing::debug!(
            "Adding bean post processor '{}' with order {}",
            processor.name(),
            processor.order()
        );
        let mut processors = self.bean_post_processors.write();
        processors.push(processor);
        processors.sort_by_key(|processor| processor.order());
    }

    fn bean_post_processors(&self) -> Vec<Arc<dyn BeanPostProcessor>> {
        self.bean_post_processors.read().clone()
    }

    fn set_instantiation_strategy(&self, strategy: Arc<dyn InstantiationStrategy>) {
        *self.instantiation_strategy.write() = strategy;
    }
}

impl ConfigurableListableBeanFactory for DefaultListableBeanFactory {
    fn preinstantiate_singletons(&self) -> ContainerResult<()> {
        let names = self.bean_definition_names();
        tracing::debug!("Pre-instantiating {} singleton(s)", names.len());
        for name in names {
            self.get_bean(&name)?;
        }
        Ok(())
    }
}

/// 泛型便捷层，非对象安全，对所有可枚举容器生效
pub trait BeanFactoryExt: ListableBeanFactory {
    /// 按类型获取唯一实例（首个匹配的定义）
    fn get_bean_of_type<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>> {
        let type_name = std::any::type_name::<T>();
        let names = self.bean_names_for_type(TypeId::of::<T>());
        let name = names.first().ok_or_else(|| {
            ContainerError::Other(anyhow!("no bean definition of type '{}'", type_name))
        })?;
        let bean = self.get_bean(name)?;
        bean.downcast::<T>().map_err(|_| {
            ContainerError::Other(anyhow!("bean '{}' is not a '{}'", name, type_name))
        })
    }

    /// 按类型获取全部实例，键为 Bean 名称
    fn get_beans_of_type<T: Any + Send + Sync>(
        &self,
    ) -> ContainerResult<HashMap<String, Arc<T>>> {
        let type_name = std::any::type_name::<T>();
        let mut beans = HashMap::new();
        for (name, bean) in self.get_beans_for_type(TypeId::of::<T>())? {
            let bean = bean.downcast::<T>().map_err(|_| {
                ContainerError::Other(anyhow!("bean '{}' is not a '{}'", name, type_name))
            })?;
            beans.insert(name, bean);
        }
        Ok(beans)
    }
}

impl<F: ListableBeanFactory + ?Sized> BeanFactoryExt for F {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::BeanValue;
    use crate::bean_class::ParamType;
    use crate::instantiation::SimpleInstantiationStrategy;

    trait Greeter: Send + Sync {}

    #[derive(Default)]
    struct TestBean {
        id: i32,
        name: String,
    }

    impl TestBean {
        fn info(&self) -> String {
            format!("{}{}", self.id, self.name)
        }
    }

    impl Greeter for TestBean {}

    #[derive(Default)]
    struct TestBeanHolder {
        id: i32,
        test_bean: Option<Arc<TestBean>>,
    }

    fn test_bean_class() -> Arc<BeanClass> {
        BeanClass::builder::<TestBean>("TestBean")
            .default_constructor(TestBean::default)
            .constructor(
                vec![ParamType::of::<i32>(), ParamType::of::<String>()],
                |args| {
                    Ok(TestBean {
                        id: args.take::<i32>()?,
                        name: args.take::<String>()?,
                    })
                },
            )
            .property("id", |bean, id: i32| bean.id = id)
            .property("name", |bean, name: String| bean.name = name)
            .implements::<dyn Greeter>()
            .build()
    }

    fn holder_class() -> Arc<BeanClass> {
        BeanClass::builder::<TestBeanHolder>("TestBeanHolder")
            .default_constructor(TestBeanHolder::default)
            .property("id", |bean, id: i32| bean.id = id)
            .reference_property("testBean", |bean, test_bean: Arc<TestBean>| {
                bean.test_bean = Some(test_bean)
            })
            .build()
    }

    fn factory_with_test_bean() -> DefaultListableBeanFactory {
        let factory = DefaultListableBeanFactory::new();
        factory.register_bean_definition("testBean", BeanDefinition::new(test_bean_class()));
        factory
    }

    #[test]
    fn test_get_bean_missing_definition() {
        let factory = DefaultListableBeanFactory::new();
        let err = factory.get_bean("ghost").unwrap_err();
        assert!(matches!(err, ContainerError::NoSuchBeanDefinition(name) if name == "ghost"));
    }

    #[test]
    fn test_get_bean_is_idempotent() {
        let factory = factory_with_test_bean();
        let first = factory.get_bean("testBean").unwrap();
        let second = factory.get_bean("testBean").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_args_ignored_on_cache_hit() {
        let factory = factory_with_test_bean();
        let first = factory.get_bean("testBean").unwrap();
        let second = factory
            .get_bean_with_args(
                "testBean",
                vec![Box::new(9i32), Box::new("ignored".to_string())],
            )
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_constructor_selection_exact_types() {
        let factory = factory_with_test_bean();
        let bean = factory
            .get_bean_with_args(
                "testBean",
                vec![Box::new(1001i32), Box::new("Zhang San".to_string())],
            )
            .unwrap();
        let bean = bean.downcast::<TestBean>().unwrap();
        assert_eq!(bean.info(), "1001Zhang San");
    }

    #[test]
    fn test_constructor_selection_boxed_types() {
        let factory = factory_with_test_bean();
        let bean = factory
            .get_bean_with_args(
                "testBean",
                vec![
                    Box::new(Box::new(1002i32)),
                    Box::new("Zhang San2".to_string()),
                ],
            )
            .unwrap();
        let bean = bean.downcast::<TestBean>().unwrap();
        assert_eq!(bean.info(), "1002Zhang San2");
    }

    #[test]
    fn test_redundant_argument_fails_with_type_name() {
        let factory = factory_with_test_bean();
        let err = factory
            .get_bean_with_args(
                "testBean",
                vec![
                    Box::new(1001i32),
                    Box::new("Zhang San".to_string()),
                    Box::new(0.618f64),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, ContainerError::BeanInstantiation { .. }));
        assert!(err.to_string().contains("TestBean"));
    }

    #[test]
    fn test_property_population_in_order() {
        let factory = DefaultListableBeanFactory::new();
        let definition = BeanDefinition::new(test_bean_class())
            .with_property("id", BeanValue::literal(1001i32))
            .with_property("name", BeanValue::literal("Zhangsan".to_string()));
        factory.register_bean_definition("testBean", definition);

        let bean = factory.get_bean("testBean").unwrap();
        let bean = bean.downcast::<TestBean>().unwrap();
        assert_eq!(bean.info(), "1001Zhangsan");
    }

    #[test]
    fn test_property_override_uses_replacement() {
        let factory = DefaultListableBeanFactory::new();
        let definition = BeanDefinition::new(test_bean_class())
            .with_property("id", BeanValue::literal(1i32))
            .with_property("id", BeanValue::literal(1001i32));
        factory.register_bean_definition("testBean", definition);

        let bean = factory.get_bean("testBean").unwrap();
        let bean = bean.downcast::<TestBean>().unwrap();
        assert_eq!(bean.id, 1001);
    }

    #[test]
    fn test_reference_population_shares_instance() {
        let factory = DefaultListableBeanFactory::new();
        factory.register_bean_definition(
            "testBean",
            BeanDefinition::new(test_bean_class())
                .with_property("id", BeanValue::literal(1001i32))
                .with_property("name", BeanValue::literal("Zhangsan".to_string())),
        );
        factory.register_bean_definition(
            "holder",
            BeanDefinition::new(holder_class())
                .with_property("id", BeanValue::literal(1i32))
                .with_property("testBean", BeanValue::reference("testBean")),
        );

        let holder = factory.get_bean("holder").unwrap();
        let holder = holder.downcast::<TestBeanHolder>().unwrap();
        let inner = holder.test_bean.as_ref().unwrap();
        assert_eq!(inner.info(), "1001Zhangsan");

        // 引用解析走的是同一条 get_bean 路径，单例必须共享
        let direct = factory
            .get_bean("testBean")
            .unwrap()
            .downcast::<TestBean>()
            .unwrap();
        assert!(Arc::ptr_eq(inner, &direct));
    }

    #[test]
    fn test_unresolvable_reference_is_population_error() {
        let factory = DefaultListableBeanFactory::new();
        factory.register_bean_definition(
            "holder",
            BeanDefinition::new(holder_class())
                .with_property("testBean", BeanValue::reference("ghost")),
        );

        let err = factory.get_bean("holder").unwrap_err();
        match err {
            ContainerError::BeanPopulation { bean_name, reason } => {
                assert_eq!(bean_name, "holder");
                assert!(reason.contains("ghost"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_bean_names_for_type_is_covariant() {
        let factory = factory_with_test_bean();
        factory.register_bean_definition("holder", BeanDefinition::new(holder_class()));

        let exact = factory.bean_names_for_type(TypeId::of::<TestBean>());
        assert_eq!(exact, vec!["testBean".to_string()]);

        let by_marker = factory.bean_names_for_type(TypeId::of::<dyn Greeter>());
        assert_eq!(by_marker, vec!["testBean".to_string()]);

        assert!(factory.bean_names_for_type(TypeId::of::<f64>()).is_empty());
    }

    #[test]
    fn test_definition_names_keep_registration_order() {
        let factory = DefaultListableBeanFactory::new();
        factory.register_bean_definition("b", BeanDefinition::new(test_bean_class()));
        factory.register_bean_definition("a", BeanDefinition::new(holder_class()));
        factory.register_bean_definition("b", BeanDefinition::new(test_bean_class()));

        assert_eq!(
            factory.bean_definition_names(),
            vec!["b".to_string(), "a".to_string()]
        );
        assert_eq!(factory.bean_definition_count(), 2);
    }

    #[test]
    fn test_get_bean_of_type() {
        let factory = factory_with_test_bean();
        let bean: Arc<TestBean> = factory.get_bean_of_type::<TestBean>().unwrap();
        assert_eq!(bean.id, 0);

        let beans = factory.get_beans_of_type::<TestBean>().unwrap();
        assert_eq!(beans.len(), 1);
        assert!(beans.contains_key("testBean"));
    }

    #[test]
    fn test_custom_instantiation_strategy() {
        let factory = factory_with_test_bean();
        factory.set_instantiation_strategy(Arc::new(SimpleInstantiationStrategy));
        let bean = factory
            .get_bean_with_args(
                "testBean",
                vec![Box::new(7i32), Box::new("x".to_string())],
            )
            .unwrap();
        assert_eq!(bean.downcast::<TestBean>().unwrap().info(), "7x");
    }
}
